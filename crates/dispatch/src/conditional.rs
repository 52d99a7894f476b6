//! Conditional node evaluation (spec §4.3). Rules are checked in listed
//! order; the first one whose `jsonpath` extraction satisfies its
//! operator wins. If none do, the condition flagged `is_default` (if any)
//! wins instead. If neither, the caller gets `None` and is expected to
//! raise `no_matching_branch` (spec §9 — a runtime error, not a
//! validation-time one).

use nebula_workflow::{Condition, ConditionOperator, ConditionRule, ConditionalSpec};
use serde_json::Value;

use crate::jsonpath;

/// Returns the id of the selected condition, or `None` if nothing matched
/// and no default condition exists.
#[must_use]
pub fn select_branch(spec: &ConditionalSpec, input: &Value) -> Option<String> {
    let payload = normalize_payload(input);
    for condition in &spec.conditions {
        if let Some(rule) = &condition.rule {
            if evaluate_rule(rule, &payload) {
                return Some(condition.id.clone());
            }
        }
    }
    default_condition(&spec.conditions)
}

fn default_condition(conditions: &[Condition]) -> Option<String> {
    conditions.iter().find(|c| c.is_default).map(|c| c.id.clone())
}

/// A string is parsed as JSON if possible; anything else (including a
/// string that fails to parse) is wrapped under a `result` key.
fn normalize_payload(input: &Value) -> Value {
    if let Value::String(s) = input {
        if let Ok(parsed) = serde_json::from_str::<Value>(s) {
            return parsed;
        }
    }
    serde_json::json!({ "result": input })
}

fn evaluate_rule(rule: &ConditionRule, payload: &Value) -> bool {
    let Some(extracted) = jsonpath::extract(&rule.jsonpath, payload) else {
        return false;
    };
    let extracted_str = stringify(extracted);

    match rule.operator {
        ConditionOperator::Equals => extracted_str == rule.value,
        ConditionOperator::NotEquals => extracted_str != rule.value,
        ConditionOperator::Contains => extracted_str.contains(&rule.value),
        ConditionOperator::GreaterThan => numeric_or_lexicographic(&extracted_str, &rule.value, |a, b| a > b, |a, b| a > b),
        ConditionOperator::LessThan => numeric_or_lexicographic(&extracted_str, &rule.value, |a, b| a < b, |a, b| a < b),
    }
}

fn numeric_or_lexicographic(
    extracted: &str,
    value: &str,
    numeric_cmp: impl Fn(f64, f64) -> bool,
    string_cmp: impl Fn(&str, &str) -> bool,
) -> bool {
    match (extracted.parse::<f64>(), value.parse::<f64>()) {
        (Ok(a), Ok(b)) => numeric_cmp(a, b),
        _ => string_cmp(extracted, value),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

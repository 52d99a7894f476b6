//! Span extraction (spec §4.6) grounded on `_extract_spans_from_trace`
//! (`original_source/backend/services/workflow_executor.py`): a span is
//! whatever object sits in the trace's `spans` array, parsed field-by-field
//! with defaults standing in for anything missing. A value that isn't even
//! an object is the only thing that gets dropped outright.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One extracted span (spec §3 data model).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub name: String,
    pub span_id: String,
    pub trace_id: String,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    /// `(end_time - start_time) / 1e6`, populated only when both are known.
    pub duration_ms: Option<f64>,
    pub status: String,
    pub kind: String,
    pub attributes: Map<String, Value>,
    pub events: Vec<Value>,
}

fn as_f64(value: &Value) -> Option<f64> {
    value.as_f64()
}

/// Parses one element of a trace's `spans` array. Returns `None` only when
/// `value` isn't a JSON object; every field within an object defaults
/// rather than failing the whole span.
pub(crate) fn parse_span(value: &Value) -> Option<Span> {
    let obj = value.as_object()?;

    let name = obj.get("name").and_then(Value::as_str).unwrap_or_default().to_string();
    let span_id = obj.get("span_id").and_then(Value::as_str).unwrap_or_default().to_string();
    let trace_id = obj.get("trace_id").and_then(Value::as_str).unwrap_or_default().to_string();
    let start_time = obj.get("start_time").and_then(as_f64);
    let end_time = obj.get("end_time").and_then(as_f64);
    let duration_ms = match (start_time, end_time) {
        (Some(start), Some(end)) => Some((end - start) / 1_000_000.0),
        _ => None,
    };
    let status = obj.get("status").and_then(Value::as_str).unwrap_or_default().to_string();
    let kind = obj.get("kind").and_then(Value::as_str).unwrap_or_default().to_string();
    let attributes = obj
        .get("attributes")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let events = obj.get("events").and_then(Value::as_array).cloned().unwrap_or_default();

    Some(Span {
        name,
        span_id,
        trace_id,
        start_time,
        end_time,
        duration_ms,
        status,
        kind,
        attributes,
        events,
    })
}

fn attr_f64(attributes: &Map<String, Value>, key: &str) -> Option<f64> {
    attributes.get(key).and_then(Value::as_f64)
}

fn attr_u64(attributes: &Map<String, Value>, key: &str) -> Option<u64> {
    attributes.get(key).and_then(Value::as_u64)
}

/// Extracts `(input_cost, output_cost, input_tokens, output_tokens)` from a
/// span's attributes, preferring GenAI semantic-convention keys over the
/// legacy `llm.*`/`cost_*` keys when both are present — the exact
/// precedence `_extract_cost_info_from_trace` applies.
pub(crate) fn extract_cost_and_tokens(attributes: &Map<String, Value>) -> (f64, f64, u64, u64) {
    let input_tokens = attr_u64(attributes, "gen_ai.usage.input_tokens")
        .or_else(|| attr_u64(attributes, "llm.token_count.prompt"))
        .unwrap_or(0);
    let output_tokens = attr_u64(attributes, "gen_ai.usage.output_tokens")
        .or_else(|| attr_u64(attributes, "llm.token_count.completion"))
        .unwrap_or(0);
    let input_cost = attr_f64(attributes, "gen_ai.usage.input_cost")
        .or_else(|| attr_f64(attributes, "cost_prompt"))
        .unwrap_or(0.0);
    let output_cost = attr_f64(attributes, "gen_ai.usage.output_cost")
        .or_else(|| attr_f64(attributes, "cost_completion"))
        .unwrap_or(0.0);

    (input_cost, output_cost, input_tokens, output_tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_object_value_yields_none() {
        assert!(parse_span(&Value::String("oops".into())).is_none());
        assert!(parse_span(&Value::Null).is_none());
    }

    #[test]
    fn missing_fields_default_rather_than_fail() {
        let span = parse_span(&serde_json::json!({})).unwrap();
        assert_eq!(span.name, "");
        assert!(span.duration_ms.is_none());
        assert!(span.attributes.is_empty());
    }

    #[test]
    fn duration_computed_from_start_and_end_in_nanoseconds() {
        let span = parse_span(&serde_json::json!({
            "start_time": 0,
            "end_time": 5_000_000
        }))
        .unwrap();
        assert_eq!(span.duration_ms, Some(5.0));
    }
}

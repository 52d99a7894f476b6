//! Typed node payloads — the closed sum type §9's "tagged variants for
//! nodes and handlers" redesign flag asks for. Constructed from
//! [`crate::wire::NodeWire`] only after `nebula-validator` has accepted the
//! surrounding graph, so field extraction here can assume well-formedness
//! and focus on typing.

use nebula_core::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WorkflowError;
use crate::wire::NodeWire;

/// Provider prefixes accepted for `model_id` (spec §4.1 check 3).
pub const ACCEPTED_MODEL_PREFIXES: &[&str] = &[
    "gpt-", "claude-", "gemini-", "llama-", "mixtral-", "anthropic", "openai", "o1-", "o3-",
];

pub fn is_valid_model_format(model_id: &str) -> bool {
    model_id.len() >= 3
        && ACCEPTED_MODEL_PREFIXES
            .iter()
            .any(|p| model_id.to_lowercase().starts_with(p))
}

/// `input`/`output` node payload format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IoFormat {
    Text,
    Json,
}

impl Default for IoFormat {
    fn default() -> Self {
        Self::Text
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    pub instructions: String,
    pub model_id: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    /// Canonicalized at dispatch time (`-` → `_`), stored here exactly as
    /// submitted (after the validator's `web_search` synthesis, if any).
    pub tool_type: Option<String>,
    #[serde(default)]
    pub inputs: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionRule {
    pub jsonpath: String,
    pub operator: ConditionOperator,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub id: String,
    pub rule: Option<ConditionRule>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalSpec {
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoSpec {
    pub format: IoFormat,
}

/// The closed sum type over the five node kinds spec §3 defines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Agent(AgentSpec),
    Tool(ToolSpec),
    Conditional(ConditionalSpec),
    Input(IoSpec),
    Output(IoSpec),
}

impl NodeKind {
    pub fn is_executable(&self) -> bool {
        matches!(self, Self::Agent(_) | Self::Tool(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Agent(_) => "agent",
            Self::Tool(_) => "tool",
            Self::Conditional(_) => "conditional",
            Self::Input(_) => "input",
            Self::Output(_) => "output",
        }
    }

    /// Parses a validated [`NodeWire`] into a typed [`NodeKind`]. Callers
    /// must have already run it through `nebula-validator`; this performs
    /// no structural checks of its own beyond what's needed to type the
    /// payload, and returns [`WorkflowError`] only for malformed JSON
    /// shapes the validator wouldn't have caught (e.g. `conditions` not an
    /// array).
    pub fn from_wire(id: &NodeId, wire: &NodeWire) -> Result<Self, WorkflowError> {
        let data = wire.data.as_ref();
        let is_tool = wire.is_tool_shaped();

        if is_tool {
            let name = wire
                .name_or_label()
                .ok_or(WorkflowError::MissingField(id.clone(), "name"))?
                .to_string();
            let tool_type = data
                .and_then(|d| d.get("tool_type"))
                .and_then(Value::as_str)
                .map(str::to_string);
            let inputs = data
                .and_then(|d| d.get("inputs"))
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            return Ok(Self::Tool(ToolSpec {
                name,
                tool_type,
                inputs,
            }));
        }

        let kind_str = wire
            .kind
            .as_deref()
            .ok_or(WorkflowError::MissingField(id.clone(), "kind"))?;
        match kind_str {
            "agent" => {
                let name = wire
                    .name_or_label()
                    .ok_or(WorkflowError::MissingField(id.clone(), "name"))?
                    .to_string();
                let instructions = wire
                    .data_str("instructions")
                    .filter(|s| !s.is_empty())
                    .ok_or(WorkflowError::MissingField(id.clone(), "instructions"))?
                    .to_string();
                let model_id = wire.data_str("model_id").map(str::to_string);
                let description = wire.data_str("description").map(str::to_string);
                Ok(Self::Agent(AgentSpec {
                    name,
                    instructions,
                    model_id,
                    description,
                }))
            }
            "conditional" => {
                let raw_conditions = data
                    .and_then(|d| d.get("conditions"))
                    .and_then(Value::as_array)
                    .ok_or(WorkflowError::MissingField(id.clone(), "conditions"))?;
                let mut conditions = Vec::with_capacity(raw_conditions.len());
                let mut seen_default = false;
                for c in raw_conditions {
                    let cid = c
                        .get("id")
                        .and_then(Value::as_str)
                        .ok_or(WorkflowError::MissingField(id.clone(), "conditions[].id"))?
                        .to_string();
                    let is_default = c
                        .get("is_default")
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                    if is_default {
                        if seen_default {
                            return Err(WorkflowError::MultipleDefaults(id.clone()));
                        }
                        seen_default = true;
                    }
                    let rule = match c.get("rule") {
                        None | Some(Value::Null) => None,
                        Some(r) => Some(parse_rule(id, r)?),
                    };
                    conditions.push(Condition {
                        id: cid,
                        rule,
                        is_default,
                    });
                }
                Ok(Self::Conditional(ConditionalSpec { conditions }))
            }
            "input" => Ok(Self::Input(IoSpec {
                format: parse_format(data),
            })),
            "output" => Ok(Self::Output(IoSpec {
                format: parse_format(data),
            })),
            other => Err(WorkflowError::UnknownKind(id.clone(), other.to_string())),
        }
    }
}

fn parse_format(data: Option<&Value>) -> IoFormat {
    match data.and_then(|d| d.get("format")).and_then(Value::as_str) {
        Some("json") => IoFormat::Json,
        _ => IoFormat::Text,
    }
}

fn parse_rule(node_id: &NodeId, value: &Value) -> Result<ConditionRule, WorkflowError> {
    let jsonpath = value
        .get("jsonpath")
        .and_then(Value::as_str)
        .ok_or(WorkflowError::MissingField(node_id.clone(), "rule.jsonpath"))?
        .to_string();
    let operator_str = value
        .get("operator")
        .and_then(Value::as_str)
        .ok_or(WorkflowError::MissingField(node_id.clone(), "rule.operator"))?;
    let operator = match operator_str {
        "equals" => ConditionOperator::Equals,
        "not_equals" => ConditionOperator::NotEquals,
        "contains" => ConditionOperator::Contains,
        "greater_than" => ConditionOperator::GreaterThan,
        "less_than" => ConditionOperator::LessThan,
        _ => return Err(WorkflowError::WrongType(node_id.clone(), "rule.operator")),
    };
    let rule_value = value
        .get("value")
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .ok_or(WorkflowError::MissingField(node_id.clone(), "rule.value"))?;
    Ok(ConditionRule {
        jsonpath,
        operator,
        value: rule_value,
    })
}

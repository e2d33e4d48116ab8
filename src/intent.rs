//! Intent parsing
//!
//! Turns the raw JSON reply from the model into a typed [`Action`]. Parsing
//! is pure: it never looks at the current todo collection, so asking to
//! delete an item that does not exist is still a well-formed intent.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// What the model wants done to the list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Intent {
    Create {
        item: String,
    },
    Read {
        item: String,
    },
    Update {
        #[serde(rename = "oldItem")]
        old_item: String,
        #[serde(rename = "newItem")]
        new_item: String,
    },
    Delete {
        item: String,
    },
    Toggle {
        item: String,
    },
}

impl Intent {
    pub fn kind(&self) -> &'static str {
        match self {
            Intent::Create { .. } => "create",
            Intent::Read { .. } => "read",
            Intent::Update { .. } => "update",
            Intent::Delete { .. } => "delete",
            Intent::Toggle { .. } => "toggle",
        }
    }
}

/// A parsed model reply: the intent plus the confirmation shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    #[serde(flatten)]
    pub intent: Intent,
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedIntent {
    #[error("reply is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("reply is not a JSON object")]
    NotAnObject,
    #[error("reply has no `action` field")]
    MissingAction,
    #[error("unknown action {0}")]
    UnknownAction(String),
    #[error("malformed `{action}` reply: {reason}")]
    InvalidShape { action: &'static str, reason: String },
    #[error("`{field}` must not be blank")]
    BlankField { field: &'static str },
}

#[derive(Deserialize)]
struct ItemPayload {
    item: String,
    response: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePayload {
    old_item: String,
    new_item: String,
    response: String,
}

/// Parse a raw model reply into an [`Action`]
pub fn parse(raw: &str) -> Result<Action, MalformedIntent> {
    let value: Value = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| MalformedIntent::InvalidJson(e.to_string()))?;

    let object = value.as_object().ok_or(MalformedIntent::NotAnObject)?;
    let action = match object.get("action") {
        None | Some(Value::Null) => return Err(MalformedIntent::MissingAction),
        Some(Value::String(s)) => s.clone(),
        Some(other) => return Err(MalformedIntent::UnknownAction(other.to_string())),
    };

    match action.as_str() {
        "create" => {
            let p = item_payload("create", value)?;
            let item = non_blank("item", &p.item)?;
            Ok(Action {
                intent: Intent::Create { item },
                response: p.response,
            })
        }
        "read" => {
            let p = item_payload("read", value)?;
            Ok(Action {
                intent: Intent::Read {
                    item: p.item,
                },
                response: p.response,
            })
        }
        "update" => {
            let p: UpdatePayload =
                serde_json::from_value(value).map_err(|e| MalformedIntent::InvalidShape {
                    action: "update",
                    reason: e.to_string(),
                })?;
            let new_item = non_blank("newItem", &p.new_item)?;
            Ok(Action {
                intent: Intent::Update {
                    old_item: p.old_item,
                    new_item,
                },
                response: p.response,
            })
        }
        "delete" => {
            let p = item_payload("delete", value)?;
            Ok(Action {
                intent: Intent::Delete {
                    item: p.item,
                },
                response: p.response,
            })
        }
        "toggle" => {
            let p = item_payload("toggle", value)?;
            Ok(Action {
                intent: Intent::Toggle {
                    item: p.item,
                },
                response: p.response,
            })
        }
        _ => Err(MalformedIntent::UnknownAction(format!("`{action}`"))),
    }
}

fn item_payload(action: &'static str, value: Value) -> Result<ItemPayload, MalformedIntent> {
    serde_json::from_value(value).map_err(|e| MalformedIntent::InvalidShape {
        action,
        reason: e.to_string(),
    })
}

fn non_blank(field: &'static str, text: &str) -> Result<String, MalformedIntent> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(MalformedIntent::BlankField { field })
    } else {
        Ok(trimmed.to_string())
    }
}

/// Some models wrap JSON in a Markdown fence even in JSON mode
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.trim()
}

//! Request and reply types for the intent service

use crate::todo::TodoCollection;
use serde::{Deserialize, Serialize};

/// What the model is asked: the user's message and the list as it stands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentRequest {
    pub message: String,
    #[serde(default)]
    pub todos: TodoCollection,
}

impl IntentRequest {
    pub fn new(message: impl Into<String>, todos: TodoCollection) -> Self {
        Self {
            message: message.into(),
            todos,
        }
    }
}

/// Raw reply from the model, before intent parsing
#[derive(Debug, Clone, Default)]
pub struct IntentReply {
    /// Message content of the first choice. Empty when the model sent none.
    pub content: String,
    pub usage: Usage,
}

/// Token accounting
#[derive(Debug, Clone, Copy, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

//! Effects produced by session transitions

use crate::intent::Action;
use crate::todo::TodoCollection;
use crate::transcript::Transcript;
use serde::Serialize;

/// Effects to be executed after a transition, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Write the full collection to the `todos` slot
    PersistTodos(TodoCollection),

    /// Write the full transcript to the `chatHistory` slot
    PersistTranscript(Transcript),

    /// Remove both slots
    ClearSlots,

    /// Ask the model to interpret `message` against `todos`
    RequestIntent {
        epoch: u64,
        message: String,
        todos: TodoCollection,
    },

    /// A round-trip finished
    NotifyOutcome(Outcome),

    /// Everything was wiped by a confirmed reset
    NotifyCleared,
}

/// How a round-trip ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outcome {
    Applied {
        action: Action,
        collection_changed: bool,
    },
    MalformedIntent {
        reason: String,
    },
    TransportFailed {
        reason: String,
    },
}

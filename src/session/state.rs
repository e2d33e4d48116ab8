//! Session state types

use crate::todo::TodoCollection;
use crate::transcript::Transcript;
use serde::Serialize;

/// Where the session is in its request cycle
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Phase {
    /// Ready for a new message
    #[default]
    Idle,

    /// A model request is in flight
    Sending {
        /// Epoch the in-flight request was issued under
        epoch: u64,
        message: String,
    },
}

/// Everything a single chat session owns
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub phase: Phase,
    /// Bumped on every accepted submit and every reset. Replies tagged with
    /// any other epoch are stale.
    pub epoch: u64,
    pub todos: TodoCollection,
    pub transcript: Transcript,
}

impl Session {
    /// A fresh idle session over previously persisted data
    pub fn hydrated(todos: TodoCollection, transcript: Transcript) -> Self {
        Self {
            phase: Phase::Idle,
            epoch: 0,
            todos,
            transcript,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Sending { .. })
    }

    /// Epoch of the in-flight request, if any
    pub fn in_flight_epoch(&self) -> Option<u64> {
        match &self.phase {
            Phase::Sending { epoch, .. } => Some(*epoch),
            Phase::Idle => None,
        }
    }
}

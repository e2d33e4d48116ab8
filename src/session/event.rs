//! Events that drive the session

use crate::llm::TransportError;

/// Events that trigger session transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User commands
    Submit {
        message: String,
    },
    ToggleItem {
        id: String,
    },
    /// `confirmed` is the answer to the reset confirmation prompt
    Reset {
        confirmed: bool,
    },

    // Model collaborator
    ReplyReceived {
        epoch: u64,
        raw: String,
    },
    TransportFailed {
        epoch: u64,
        error: TransportError,
    },
}

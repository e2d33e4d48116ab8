//! Chat transcript
//!
//! Lines carry an explicit speaker. The `You: ` / `AI: ` prefixes only exist
//! at the boundary: the persisted `chatHistory` slot and rendered output.

use serde::{Deserialize, Serialize};

pub const USER_PREFIX: &str = "You: ";
pub const ASSISTANT_PREFIX: &str = "AI: ";

/// Assistant line used when the model reply cannot be parsed
pub const MALFORMED_INTENT_REPLY: &str = "Sorry, I had trouble processing that request.";

/// Assistant line used when the model could not be reached
pub const TRANSPORT_FAILURE_REPLY: &str = "Sorry, there was an error processing your request.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub speaker: Speaker,
    pub text: String,
}

impl ChatLine {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }

    pub fn render(&self) -> String {
        let prefix = match self.speaker {
            Speaker::User => USER_PREFIX,
            Speaker::Assistant => ASSISTANT_PREFIX,
        };
        format!("{prefix}{}", self.text)
    }

    /// Recover a line from its rendered form.
    ///
    /// Strings without a known prefix are kept whole as assistant lines.
    pub fn from_rendered(line: &str) -> Self {
        if let Some(text) = line.strip_prefix(USER_PREFIX) {
            Self::user(text)
        } else if let Some(text) = line.strip_prefix(ASSISTANT_PREFIX) {
            Self::assistant(text)
        } else {
            Self::assistant(line)
        }
    }
}

/// Append-only sequence of chat lines
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Transcript {
    lines: Vec<ChatLine>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[allow(dead_code)] // Used by tests
    pub fn lines(&self) -> &[ChatLine] {
        &self.lines
    }

    #[allow(dead_code)] // Used by tests
    pub fn last(&self) -> Option<&ChatLine> {
        self.lines.last()
    }

    #[must_use]
    pub fn with_line(mut self, line: ChatLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Prefix-string form, as stored in the `chatHistory` slot
    pub fn rendered(&self) -> Vec<String> {
        self.lines.iter().map(ChatLine::render).collect()
    }
}

impl From<Vec<String>> for Transcript {
    fn from(raw: Vec<String>) -> Self {
        Self {
            lines: raw.iter().map(|line| ChatLine::from_rendered(line)).collect(),
        }
    }
}

impl From<Transcript> for Vec<String> {
    fn from(transcript: Transcript) -> Self {
        transcript.rendered()
    }
}

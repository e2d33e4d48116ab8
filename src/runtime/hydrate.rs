//! Startup load of the persisted session
//!
//! Slot content is never trusted: anything missing, unreadable or malformed
//! loads as empty so that startup cannot fail on bad data.

use super::traits::SlotStore;
use crate::session::Session;
use crate::store::{CHAT_HISTORY_SLOT, TODOS_SLOT};
use crate::todo::TodoCollection;
use crate::transcript::Transcript;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Why a slot's content was discarded
#[derive(Debug, Error)]
pub enum StorageCorrupt {
    #[error("slot `{slot}` could not be read: {reason}")]
    Unreadable { slot: &'static str, reason: String },
    #[error("slot `{slot}` holds malformed JSON: {reason}")]
    Malformed { slot: &'static str, reason: String },
}

/// Rehydrate the session from both slots
pub async fn load_session<S: SlotStore + ?Sized>(slots: &S) -> Session {
    let todos: TodoCollection = load_or_empty(slots, TODOS_SLOT).await;
    let transcript: Transcript = load_or_empty(slots, CHAT_HISTORY_SLOT).await;

    tracing::info!(
        todos = todos.len(),
        chat_lines = transcript.len(),
        "Loaded session from slots"
    );
    Session::hydrated(todos, transcript)
}

async fn load_or_empty<S, T>(slots: &S, slot: &'static str) -> T
where
    S: SlotStore + ?Sized,
    T: DeserializeOwned + Default,
{
    match decode_slot(slot, slots.load_slot(slot).await) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(slot, error = %e, "Discarding corrupt slot, starting empty");
            T::default()
        }
    }
}

fn decode_slot<T>(
    slot: &'static str,
    raw: Result<Option<String>, String>,
) -> Result<T, StorageCorrupt>
where
    T: DeserializeOwned + Default,
{
    match raw {
        Ok(None) => Ok(T::default()),
        Ok(Some(json)) => serde_json::from_str(&json).map_err(|e| StorageCorrupt::Malformed {
            slot,
            reason: e.to_string(),
        }),
        Err(reason) => Err(StorageCorrupt::Unreadable { slot, reason }),
    }
}

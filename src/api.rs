//! HTTP API for todo-chat

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::llm::IntentService;
use crate::runtime::SessionHandle;
use std::sync::Arc;

/// Shown to the user before a reset, and returned when one is not confirmed
pub const RESET_CONFIRMATION_PROMPT: &str =
    "Are you sure you want to clear all todos and chat history?";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
    /// Used directly by the raw `/api/chat` proxy
    pub llm: Arc<dyn IntentService>,
}

impl AppState {
    pub fn new(session: SessionHandle, llm: Arc<dyn IntentService>) -> Self {
        Self { session, llm }
    }
}

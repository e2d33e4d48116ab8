//! Model collaborator
//!
//! The model turns a free-form message plus the current list into a JSON
//! intent. Everything here is transport: interpreting the reply is the job of
//! [`crate::intent`].

mod error;
mod openai;
mod prompt;
mod types;

pub use error::TransportError;
#[allow(unused_imports)] // Matched on by tests
pub use error::TransportErrorKind;
pub use openai::OpenAiIntentService;
#[allow(unused_imports)] // Usage is also built by test doubles
pub use types::{IntentReply, IntentRequest, Usage};

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for intent providers
#[async_trait]
pub trait IntentService: Send + Sync {
    /// Ask the model to interpret `request.message` against `request.todos`
    async fn request_intent(&self, request: &IntentRequest) -> Result<IntentReply, TransportError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: IntentService + ?Sized> IntentService for Arc<T> {
    async fn request_intent(&self, request: &IntentRequest) -> Result<IntentReply, TransportError> {
        self.as_ref().request_intent(request).await
    }

    fn model_id(&self) -> &str {
        self.as_ref().model_id()
    }
}

/// Logging wrapper for intent services
pub struct LoggingService {
    inner: Arc<dyn IntentService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn IntentService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl IntentService for LoggingService {
    async fn request_intent(&self, request: &IntentRequest) -> Result<IntentReply, TransportError> {
        let start = std::time::Instant::now();
        let result = self.inner.request_intent(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    todos = request.todos.len(),
                    input_tokens = reply.usage.input_tokens,
                    output_tokens = reply.usage.output_tokens,
                    "Intent request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = ?e.kind,
                    retryable = e.kind.is_retryable(),
                    "Intent request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Stand-in used when no API key is configured. Every request fails with an
/// auth error, which the session turns into the canned transport reply.
pub struct UnconfiguredService {
    model_id: String,
}

impl UnconfiguredService {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
        }
    }
}

#[async_trait]
impl IntentService for UnconfiguredService {
    async fn request_intent(
        &self,
        _request: &IntentRequest,
    ) -> Result<IntentReply, TransportError> {
        Err(TransportError::auth("OPENAI_API_KEY is not set"))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

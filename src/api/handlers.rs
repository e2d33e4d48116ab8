//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    AssistantMessage, ErrorResponse, MessageRequest, OkResponse, QueuedResponse, ResetRequest,
    SessionResponse,
};
use super::{AppState, RESET_CONFIRMATION_PROMPT};
use crate::llm::IntentRequest;
use crate::render::render_session;
use crate::runtime::CommandError;
use crate::session::{Event, TransitionError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session retrieval
        .route("/api/session", get(get_session))
        .route("/api/session/view", get(get_session_view))
        // SSE streaming
        .route("/api/session/stream", get(stream_session))
        // User actions
        .route("/api/messages", post(send_message))
        .route("/api/todos/:id/toggle", post(toggle_todo))
        .route("/api/reset", post(reset_session))
        // Raw model proxy
        .route("/api/chat", post(chat_proxy))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session Retrieval
// ============================================================

async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    Json(SessionResponse {
        snapshot: state.session.snapshot(),
        reset_prompt: RESET_CONFIRMATION_PROMPT,
    })
}

async fn get_session_view(State(state): State<AppState>) -> String {
    render_session(&state.session.snapshot())
}

async fn stream_session(State(state): State<AppState>) -> impl IntoResponse {
    // Subscribe first so nothing published after the init snapshot is missed
    let broadcast_rx = state.session.subscribe();
    sse_stream(state.session.snapshot(), broadcast_rx)
}

// ============================================================
// User Actions
// ============================================================

async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<QueuedResponse>, AppError> {
    if req.message.trim().is_empty() {
        return Ok(Json(QueuedResponse { queued: false }));
    }

    // Busy is decided by the runtime, not the published snapshot
    match state
        .session
        .dispatch(Event::Submit {
            message: req.message,
        })
        .await
    {
        Ok(()) => Ok(Json(QueuedResponse { queued: true })),
        Err(CommandError::Rejected(e @ TransitionError::Busy)) => {
            Err(AppError::Conflict(e.to_string()))
        }
        Err(e) => Err(AppError::Internal(e.to_string())),
    }
}

async fn toggle_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, AppError> {
    if !state.session.snapshot().todos.contains_id(&id) {
        return Err(AppError::NotFound(format!("Todo not found: {id}")));
    }

    state
        .session
        .send(Event::ToggleItem { id })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(OkResponse { ok: true }))
}

async fn reset_session(
    State(state): State<AppState>,
    body: Option<Json<ResetRequest>>,
) -> Result<Json<OkResponse>, AppError> {
    let Json(req) = body.unwrap_or_default();
    if !req.confirm {
        return Err(AppError::BadRequest(RESET_CONFIRMATION_PROMPT.to_string()));
    }

    state
        .session
        .send(Event::Reset { confirmed: true })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(OkResponse { ok: true }))
}

// ============================================================
// Raw Model Proxy
// ============================================================

async fn chat_proxy(
    State(state): State<AppState>,
    Json(req): Json<IntentRequest>,
) -> Result<Json<AssistantMessage>, AppError> {
    match state.llm.request_intent(&req).await {
        Ok(reply) => Ok(Json(AssistantMessage {
            role: "assistant",
            content: reply.content,
        })),
        Err(e) => {
            tracing::error!(error = %e, kind = ?e.kind, "Model proxy request failed");
            Err(AppError::Internal("Internal Server Error".to_string()))
        }
    }
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("todo-chat ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}

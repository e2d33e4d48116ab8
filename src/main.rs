//! todo-chat - a todo list driven by natural-language chat
//!
//! The user's messages go to a language model that answers with a structured
//! intent; the intent is reconciled against the list and both the list and
//! the chat are persisted.

mod api;
mod config;
mod intent;
mod llm;
mod reconcile;
mod render;
mod runtime;
mod session;
mod store;
mod todo;
mod transcript;

use api::{create_router, AppState};
use config::AppConfig;
use llm::{IntentService, LoggingService, OpenAiIntentService, UnconfiguredService};
use runtime::{load_session, spawn_session, DatabaseSlots};
use std::net::SocketAddr;
use std::sync::Arc;
use store::Database;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_chat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = AppConfig::from_env()?;

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Initialize database
    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;
    let slots = DatabaseSlots::new(db);

    // Model collaborator
    let llm: Arc<dyn IntentService> = match &config.openai_api_key {
        Some(key) => Arc::new(OpenAiIntentService::new(
            key.clone(),
            config.model.clone(),
            config.gateway.as_deref(),
            config.request_timeout,
        )?),
        None => {
            tracing::warn!("No model API key configured. Set OPENAI_API_KEY.");
            Arc::new(UnconfiguredService::new(config.model.clone()))
        }
    };
    let llm: Arc<dyn IntentService> = Arc::new(LoggingService::new(llm));
    tracing::info!(
        model = %llm.model_id(),
        gateway = ?config.gateway,
        "Model service initialized"
    );

    // Rehydrate and start the session
    let session = load_session(&slots).await;
    let handle = spawn_session(session, slots, llm.clone());

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(AppState::new(handle, llm))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("todo-chat server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

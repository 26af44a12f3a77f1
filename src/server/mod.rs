#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! HTTP surface for the tutor.

/// Error responses
pub mod error;
/// Route handlers
pub mod handlers;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tracing::info;

use crate::{
    config::{ServerEnv, StageOptions},
    provider::TextCompletionClient,
    tutor::{LessonStage, TutorPipeline, TutorPrompts},
};

/// Shared, read-only state handed to every handler.
pub struct AppState<C> {
    /// Grade → feedback → moderation pipeline.
    pipeline: TutorPipeline<Arc<C>>,
    /// Lesson, exercise and ungraded feedback generators.
    lessons:  LessonStage<Arc<C>>,
}

impl<C: TextCompletionClient> AppState<C> {
    /// Builds the state around one shared completion client.
    pub fn new(client: C, prompts: &TutorPrompts, stages: &StageOptions) -> Self {
        let client = Arc::new(client);
        let pipeline = TutorPipeline::configured(Arc::clone(&client), prompts, stages);
        let lessons = LessonStage::new(client, prompts).with_options(stages.lesson.clone());
        Self { pipeline, lessons }
    }
}

/// Builds the router for all tutor endpoints.
pub fn router<C: TextCompletionClient + 'static>(state: AppState<C>) -> Router {
    Router::new()
        .route("/api/chat", post(handlers::chat::<C>))
        .route("/api/lesson", post(handlers::lesson::<C>))
        .route("/api/exercise", post(handlers::exercise::<C>))
        .route("/api/feedback", post(handlers::feedback::<C>))
        .route("/health", get(handlers::health))
        .with_state(Arc::new(state))
}

/// Binds `server` and serves `app` until Ctrl-C.
pub async fn serve(app: Router, server: &ServerEnv) -> Result<()> {
    let addr = server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Server is running on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server stopped unexpectedly")
}

/// Resolves once the process receives Ctrl-C.
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}

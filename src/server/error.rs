#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

use crate::tutor::{FieldError, PipelineError, StageError};

/// Errors returned by the HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Request fields failed validation; answered with an `errors` array.
    Invalid(Vec<FieldError>),
    /// Required fields were missing; answered with a single `error` message.
    MissingFields(&'static str),
    /// The tutor pipeline failed.
    Pipeline(PipelineError),
    /// A single-prompt generator failed.
    Generation {
        /// What was being generated, e.g. `lesson`.
        what:   &'static str,
        /// Underlying failure, logged but never returned.
        source: StageError,
    },
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(errors) => ApiError::Invalid(errors),
            other => ApiError::Pipeline(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Invalid(errors) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
            }
            ApiError::MissingFields(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Pipeline(err) => {
                match &err {
                    PipelineError::ContentRejected => warn!("Error in /api/chat: {err}"),
                    _ => error!("Error in /api/chat: {err}"),
                }
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": err.public_message() })),
                )
                    .into_response()
            }
            ApiError::Generation { what, source } => {
                error!("Failed to generate {what}: {source}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": format!("Failed to generate {what}.") })),
                )
                    .into_response()
            }
        }
    }
}

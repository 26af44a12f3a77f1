#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde_json::{Value, json};
use tracing::debug;

use super::{AppState, error::ApiError};
use crate::{
    provider::TextCompletionClient,
    tutor::{FieldError, PipelineRequest, TutorReply},
};

/// Reads `field` from `body` as a string, recording a validation error if it
/// is missing, not a string, or blank.
fn string_field(body: &Value, field: &'static str, errors: &mut Vec<FieldError>) -> String {
    let label = capitalize(field);
    match body.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::String(_)) => {
            errors.push(FieldError::new(field, format!("{label} must not be empty.")));
            String::new()
        }
        _ => {
            errors.push(FieldError::new(field, format!("{label} must be a string.")));
            String::new()
        }
    }
}

/// Upper-cases the first letter of a field name for messages.
fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Unwraps the JSON body, turning a malformed body into a field error.
fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        ApiError::Invalid(vec![FieldError::new("body", rejection.body_text())])
    })
}

/// Extracts two required, non-blank string fields for the single-prompt
/// endpoints, which report a single message on failure.
fn required_pair(
    body: Result<Json<Value>, JsonRejection>,
    first: &'static str,
    second: &'static str,
    message: &'static str,
) -> Result<(String, String), ApiError> {
    let body = json_body(body).map_err(|_| ApiError::MissingFields(message))?;
    let mut errors = Vec::new();
    let a = string_field(&body, first, &mut errors);
    let b = string_field(&body, second, &mut errors);
    if errors.is_empty() {
        Ok((a, b))
    } else {
        Err(ApiError::MissingFields(message))
    }
}

/// `POST /api/chat`: grade, explain, and moderate an answer.
pub async fn chat<C: TextCompletionClient + 'static>(
    State(state): State<Arc<AppState<C>>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<TutorReply>, ApiError> {
    let body = json_body(body)?;
    let mut errors = Vec::new();
    let language = string_field(&body, "language", &mut errors);
    let answer = string_field(&body, "answer", &mut errors);
    if !errors.is_empty() {
        debug!(?errors, "Rejected chat request");
        return Err(ApiError::Invalid(errors));
    }

    let request = PipelineRequest::new(language, answer);
    let reply = state.pipeline.process_request(&request).await?;
    Ok(Json(reply))
}

/// `POST /api/lesson`: write a brief lesson on a topic.
pub async fn lesson<C: TextCompletionClient + 'static>(
    State(state): State<Arc<AppState<C>>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let (language, topic) =
        required_pair(body, "language", "topic", "Language and topic are required.")?;
    let lesson = state
        .lessons
        .lesson(&language, &topic)
        .await
        .map_err(|source| ApiError::Generation {
            what: "lesson",
            source,
        })?;
    Ok(Json(json!({ "lesson": lesson })))
}

/// `POST /api/exercise`: write a practice exercise on a topic.
pub async fn exercise<C: TextCompletionClient + 'static>(
    State(state): State<Arc<AppState<C>>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let (language, topic) =
        required_pair(body, "language", "topic", "Language and topic are required.")?;
    let exercise = state
        .lessons
        .exercise(&language, &topic)
        .await
        .map_err(|source| ApiError::Generation {
            what: "exercise",
            source,
        })?;
    Ok(Json(json!({ "exercise": exercise })))
}

/// `POST /api/feedback`: ungraded feedback on an answer.
pub async fn feedback<C: TextCompletionClient + 'static>(
    State(state): State<Arc<AppState<C>>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let (language, answer) =
        required_pair(body, "language", "answer", "Language and answer are required.")?;
    let feedback = state
        .lessons
        .answer_feedback(&language, &answer)
        .await
        .map_err(|source| ApiError::Generation {
            what: "feedback",
            source,
        })?;
    Ok(Json(json!({ "feedback": feedback })))
}

/// `GET /health`: liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

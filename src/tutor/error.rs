#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use itertools::Itertools;
use serde::Serialize;
use thiserror::Error;

use super::prompt::PromptError;
use crate::provider::ProviderError;

/// Failure of a single stage.
#[derive(Debug, Error)]
pub enum StageError {
    /// The completion backend failed or timed out.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// The grading response was not a well-formed grade.
    #[error("could not parse a grade from provider output ({reason}): `{raw}`")]
    GradingParse {
        /// The text returned by the provider.
        raw:    String,
        /// What was wrong with it.
        reason: String,
    },
    /// The prompt template could not be rendered.
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

/// A single invalid request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Name of the offending field.
    pub field:   String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl FieldError {
    /// Creates a new field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field:   field.into(),
            message: message.into(),
        }
    }
}

/// Failure of a whole pipeline run.
///
/// `Validation` never reaches a provider; the other variants name the stage
/// that stopped the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The request itself was malformed.
    #[error("invalid request: {}", .0.iter().map(|e| &e.message).join(" "))]
    Validation(Vec<FieldError>),
    /// The grading stage failed.
    #[error("grading failed: {0}")]
    GradingFailed(#[source] StageError),
    /// The feedback stage failed.
    #[error("feedback generation failed: {0}")]
    FeedbackFailed(#[source] StageError),
    /// Moderation flagged the generated feedback.
    #[error("generated feedback was rejected by moderation")]
    ContentRejected,
}

impl PipelineError {
    /// Returns a message safe to show to callers. Provider output and error
    /// details are never included.
    pub fn public_message(&self) -> String {
        match self {
            PipelineError::Validation(errors) => errors.iter().map(|e| &e.message).join(" "),
            PipelineError::GradingFailed(_) => {
                "Failed to process chat: the answer could not be graded.".to_string()
            }
            PipelineError::FeedbackFailed(_) => {
                "Failed to process chat: feedback could not be generated.".to_string()
            }
            PipelineError::ContentRejected => {
                "Generated feedback contains inappropriate content.".to_string()
            }
        }
    }
}

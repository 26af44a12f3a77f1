#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use itertools::Itertools;
use tracing::debug;

use super::{
    error::StageError,
    grading::Grade,
    prompt::{TutorPrompts, render},
};
use crate::{
    constants::NO_FEEDBACK,
    provider::{CompletionOptions, TextCompletionClient},
};

/// Formats the mistakes list for inclusion in the feedback prompt.
fn format_mistakes(grade: &Grade) -> String {
    if grade.mistakes().is_empty() {
        return "- none".to_string();
    }
    grade.mistakes().iter().map(|m| format!("- {m}")).join("\n")
}

/// Turns a grade into prose feedback for the learner.
#[derive(Debug, Clone)]
pub struct FeedbackStage<C> {
    /// Completion backend.
    client:   C,
    /// Feedback prompt template.
    template: String,
    /// Sampling options for the feedback call.
    options:  CompletionOptions,
}

impl<C: TextCompletionClient> FeedbackStage<C> {
    /// Creates a feedback stage using the embedded prompt.
    pub fn new(client: C, prompts: &TutorPrompts) -> Self {
        Self {
            client,
            template: prompts.feedback().to_string(),
            options: CompletionOptions::default(),
        }
    }

    /// Replaces the sampling options.
    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    /// Writes feedback for `grade`. Whitespace-only output becomes
    /// [`NO_FEEDBACK`].
    pub async fn feedback(&self, language: &str, grade: &Grade) -> Result<String, StageError> {
        let mark = grade.mark().to_string();
        let mistakes = format_mistakes(grade);
        let prompt = render(&self.template, &[
            ("language", language),
            ("mark", mark.as_str()),
            ("mistakes", mistakes.as_str()),
        ])?;

        let text = self.client.complete(&prompt, &self.options).await?;
        let text = text.trim();
        debug!(chars = text.len(), "Feedback generated");

        Ok(if text.is_empty() {
            NO_FEEDBACK.to_string()
        } else {
            text.to_string()
        })
    }
}

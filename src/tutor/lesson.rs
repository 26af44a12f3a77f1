#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Single-prompt generators behind the lesson, exercise and ungraded feedback
//! endpoints.

use tracing::debug;

use super::{
    error::StageError,
    prompt::{TutorPrompts, render},
};
use crate::{
    constants::{NO_EXERCISE, NO_FEEDBACK, NO_LESSON},
    provider::{CompletionOptions, TextCompletionClient},
};

/// Generates lessons, exercises and free-form feedback.
#[derive(Debug, Clone)]
pub struct LessonStage<C> {
    /// Completion backend.
    client:  C,
    /// Prompt catalog.
    prompts: TutorPrompts,
    /// Sampling options shared by all three generators.
    options: CompletionOptions,
}

impl<C: TextCompletionClient> LessonStage<C> {
    /// Creates a generator over `client`.
    pub fn new(client: C, prompts: &TutorPrompts) -> Self {
        Self {
            client,
            prompts: prompts.clone(),
            options: CompletionOptions::default(),
        }
    }

    /// Replaces the sampling options.
    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    /// Writes a brief lesson on `topic`.
    pub async fn lesson(&self, language: &str, topic: &str) -> Result<String, StageError> {
        let prompt = render(self.prompts.lesson(), &[("language", language), ("topic", topic)])?;
        self.generate(&prompt, NO_LESSON).await
    }

    /// Writes a practice exercise on `topic`.
    pub async fn exercise(&self, language: &str, topic: &str) -> Result<String, StageError> {
        let prompt =
            render(self.prompts.exercise(), &[("language", language), ("topic", topic)])?;
        self.generate(&prompt, NO_EXERCISE).await
    }

    /// Gives ungraded feedback on `answer`.
    pub async fn answer_feedback(
        &self,
        language: &str,
        answer: &str,
    ) -> Result<String, StageError> {
        let prompt = render(self.prompts.answer_feedback(), &[
            ("language", language),
            ("answer", answer),
        ])?;
        self.generate(&prompt, NO_FEEDBACK).await
    }

    /// Runs `prompt` and substitutes `fallback` for blank output.
    async fn generate(&self, prompt: &str, fallback: &str) -> Result<String, StageError> {
        let text = self.client.complete(prompt, &self.options).await?;
        let text = text.trim();
        debug!(chars = text.len(), "Generated tutor text");

        Ok(if text.is_empty() {
            fallback.to_string()
        } else {
            text.to_string()
        })
    }
}

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use tracing::{debug, warn};

use super::prompt::{TutorPrompts, render};
use crate::{
    config::StageOptions,
    provider::{CompletionOptions, TextCompletionClient},
};

/// Outcome of screening generated feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Safe to show to the learner.
    Clean,
    /// Must be withheld.
    Flagged,
}

impl Verdict {
    /// Interprets a moderation reply. Only `clean`, ignoring case and
    /// surrounding whitespace, counts as clean.
    pub fn from_reply(reply: &str) -> Self {
        if reply.trim().to_lowercase() == "clean" {
            Verdict::Clean
        } else {
            Verdict::Flagged
        }
    }

    /// Returns true for [`Verdict::Clean`].
    pub fn is_clean(self) -> bool {
        self == Verdict::Clean
    }
}

impl From<Verdict> for bool {
    fn from(verdict: Verdict) -> Self {
        verdict.is_clean()
    }
}

/// Screens generated feedback before it reaches the learner.
///
/// This stage fails open: if the provider cannot be reached the feedback is
/// treated as clean, so a moderation outage never blocks a reply.
#[derive(Debug, Clone)]
pub struct ModerationStage<C> {
    /// Completion backend.
    client:   C,
    /// Moderation prompt template.
    template: String,
    /// Sampling options for the moderation call.
    options:  CompletionOptions,
}

impl<C: TextCompletionClient> ModerationStage<C> {
    /// Creates a moderation stage using the embedded prompt.
    pub fn new(client: C, prompts: &TutorPrompts) -> Self {
        Self {
            client,
            template: prompts.moderation().to_string(),
            options: StageOptions::default().moderation,
        }
    }

    /// Replaces the sampling options.
    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the verdict for `feedback`.
    pub async fn verdict(&self, language: &str, feedback: &str) -> Verdict {
        let prompt = match render(&self.template, &[
            ("language", language),
            ("feedback", feedback),
        ]) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!("Moderation prompt could not be rendered, treating feedback as clean: {e}");
                return Verdict::Clean;
            }
        };

        match self.client.complete(&prompt, &self.options).await {
            Ok(reply) => {
                let verdict = Verdict::from_reply(&reply);
                debug!(?verdict, "Feedback moderated");
                verdict
            }
            Err(e) => {
                warn!("Moderation call failed, treating feedback as clean: {e}");
                Verdict::Clean
            }
        }
    }

    /// Returns true when `feedback` may be shown to the learner.
    pub async fn moderate(&self, language: &str, feedback: &str) -> bool {
        self.verdict(language, feedback).await.into()
    }
}

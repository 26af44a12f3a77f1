#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    error::StageError,
    prompt::{TutorPrompts, render},
};
use crate::{
    config::StageOptions,
    constants::{MAX_MARK, MIN_MARK},
    provider::{CompletionOptions, TextCompletionClient},
};

/// A validated grade for a learner's answer.
///
/// Only constructible through [`Grade::new`] or [`Grade::parse`], so `mark`
/// is always within `1..=10`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grade {
    /// Score awarded, from 1 to 10.
    mark:     u8,
    /// Mistakes found, in the order the tutor listed them.
    mistakes: Vec<String>,
}

/// Shape the grading prompt asks the provider to produce.
#[derive(Deserialize)]
struct RawGrade {
    /// Score, validated after deserialization.
    mark:     i64,
    /// Mistakes found.
    mistakes: Vec<String>,
}

impl Grade {
    /// Creates a grade, or returns `None` if `mark` is out of range.
    pub fn new(mark: u8, mistakes: Vec<String>) -> Option<Self> {
        (MIN_MARK..=MAX_MARK)
            .contains(&mark)
            .then_some(Self { mark, mistakes })
    }

    /// Parses the provider's reply into a grade.
    ///
    /// A surrounding Markdown code fence is tolerated; anything else that is
    /// not a JSON object with an integer `mark` in `1..=10` and a string array
    /// `mistakes` is a [`StageError::GradingParse`].
    pub fn parse(raw: &str) -> Result<Self, StageError> {
        let parse_error = |reason: String| StageError::GradingParse {
            raw: raw.to_string(),
            reason,
        };

        let parsed: RawGrade =
            serde_json::from_str(strip_code_fence(raw)).map_err(|e| parse_error(e.to_string()))?;

        let mark = u8::try_from(parsed.mark)
            .ok()
            .filter(|mark| (MIN_MARK..=MAX_MARK).contains(mark))
            .ok_or_else(|| {
                parse_error(format!(
                    "mark {} is outside {MIN_MARK}..={MAX_MARK}",
                    parsed.mark
                ))
            })?;

        Ok(Self {
            mark,
            mistakes: parsed.mistakes,
        })
    }

    /// Returns the score awarded.
    pub fn mark(&self) -> u8 {
        self.mark
    }

    /// Returns the mistakes found.
    pub fn mistakes(&self) -> &[String] {
        &self.mistakes
    }

    /// Returns true for a perfect score.
    pub fn is_perfect(&self) -> bool {
        self.mark == MAX_MARK
    }
}

impl Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.mark, MAX_MARK)
    }
}

/// Removes a leading ```` ``` ```` or ```` ```json ```` line and a trailing
/// fence, if both are present.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    match body.split_once('\n') {
        Some((_lang, inner)) => inner.trim(),
        None => body.trim(),
    }
}

/// Scores a learner's answer.
#[derive(Debug, Clone)]
pub struct GradingStage<C> {
    /// Completion backend.
    client:   C,
    /// Grading prompt template.
    template: String,
    /// Sampling options for the grading call.
    options:  CompletionOptions,
}

impl<C: TextCompletionClient> GradingStage<C> {
    /// Creates a grading stage using the embedded prompt.
    pub fn new(client: C, prompts: &TutorPrompts) -> Self {
        Self {
            client,
            template: prompts.grading().to_string(),
            options: StageOptions::default().grading,
        }
    }

    /// Replaces the sampling options.
    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    /// Grades `answer`, written in `language`.
    pub async fn grade(&self, language: &str, answer: &str) -> Result<Grade, StageError> {
        let prompt = render(&self.template, &[("language", language), ("answer", answer)])?;
        let raw = self.client.complete(&prompt, &self.options).await?;

        let grade = Grade::parse(&raw).inspect_err(|e| warn!("Unusable grading response: {e}"))?;
        debug!(mark = grade.mark(), mistakes = grade.mistakes().len(), "Answer graded");
        Ok(grade)
    }
}

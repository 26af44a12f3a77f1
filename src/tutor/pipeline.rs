#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use super::{
    error::{FieldError, PipelineError},
    feedback::FeedbackStage,
    grading::GradingStage,
    moderation::ModerationStage,
    prompt::TutorPrompts,
};
use crate::{config::StageOptions, provider::TextCompletionClient};

/// A learner's answer to be graded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRequest {
    /// Language the learner is studying.
    pub language: String,
    /// The learner's answer.
    pub answer:   String,
}

impl PipelineRequest {
    /// Creates a request.
    pub fn new(language: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            answer:   answer.into(),
        }
    }

    /// Checks that both fields are non-blank.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let mut errors = Vec::new();
        if self.language.trim().is_empty() {
            errors.push(FieldError::new("language", "Language must be a non-empty string."));
        }
        if self.answer.trim().is_empty() {
            errors.push(FieldError::new("answer", "Answer must be a non-empty string."));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::Validation(errors))
        }
    }
}

/// Successful pipeline output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorReply {
    /// Score awarded, from 1 to 10.
    pub mark:     u8,
    /// Moderated feedback text.
    pub feedback: String,
}

/// Grades an answer, writes feedback on it, and moderates that feedback.
///
/// The three stages run strictly in sequence. Grading and feedback failures
/// end the run; moderation never fails, but a flagged verdict withholds the
/// feedback as [`PipelineError::ContentRejected`].
#[derive(Debug, Clone)]
pub struct TutorPipeline<G, F = G, M = G> {
    /// Scores the answer.
    grading:    GradingStage<G>,
    /// Explains the score.
    feedback:   FeedbackStage<F>,
    /// Screens the explanation.
    moderation: ModerationStage<M>,
}

impl<C: TextCompletionClient> TutorPipeline<Arc<C>> {
    /// Builds a pipeline whose stages all share `client`, with default
    /// sampling options.
    pub fn shared(client: Arc<C>, prompts: &TutorPrompts) -> Self {
        Self::configured(client, prompts, &StageOptions::default())
    }

    /// Builds a pipeline whose stages all share `client`, each using its own
    /// entry from `stages`.
    pub fn configured(client: Arc<C>, prompts: &TutorPrompts, stages: &StageOptions) -> Self {
        Self::new(
            GradingStage::new(Arc::clone(&client), prompts).with_options(stages.grading.clone()),
            FeedbackStage::new(Arc::clone(&client), prompts).with_options(stages.feedback.clone()),
            ModerationStage::new(client, prompts).with_options(stages.moderation.clone()),
        )
    }
}

impl<G, F, M> TutorPipeline<G, F, M>
where
    G: TextCompletionClient,
    F: TextCompletionClient,
    M: TextCompletionClient,
{
    /// Assembles a pipeline from its stages.
    pub fn new(
        grading: GradingStage<G>,
        feedback: FeedbackStage<F>,
        moderation: ModerationStage<M>,
    ) -> Self {
        Self {
            grading,
            feedback,
            moderation,
        }
    }

    /// Validates `request`, then processes it.
    pub async fn process_request(
        &self,
        request: &PipelineRequest,
    ) -> Result<TutorReply, PipelineError> {
        request.validate()?;
        self.process(&request.language, &request.answer).await
    }

    /// Runs all three stages for `answer`.
    pub async fn process(&self, language: &str, answer: &str) -> Result<TutorReply, PipelineError> {
        let span = info_span!("tutor", request_id = %Uuid::new_v4(), %language);
        self.run(language, answer).instrument(span).await
    }

    /// Stage sequence, run inside the request span.
    async fn run(&self, language: &str, answer: &str) -> Result<TutorReply, PipelineError> {
        debug!("Grading answer");
        let grade = self
            .grading
            .grade(language, answer)
            .await
            .map_err(PipelineError::GradingFailed)?;

        debug!(mark = grade.mark(), "Generating feedback");
        let feedback = self
            .feedback
            .feedback(language, &grade)
            .await
            .map_err(PipelineError::FeedbackFailed)?;

        debug!("Moderating feedback");
        if !self.moderation.moderate(language, &feedback).await {
            warn!(mark = grade.mark(), "Feedback withheld by moderation");
            return Err(PipelineError::ContentRejected);
        }

        info!(mark = grade.mark(), "Answer processed");
        Ok(TutorReply {
            mark: grade.mark(),
            feedback,
        })
    }
}

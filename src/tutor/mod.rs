#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Stage and pipeline error types
pub mod error;
/// Turns a grade into prose feedback
pub mod feedback;
/// Scores answers and parses the structured grade
pub mod grading;
/// Lesson, exercise and ungraded feedback generators
pub mod lesson;
/// Screens generated feedback
pub mod moderation;
/// Composes the grading, feedback and moderation stages
pub mod pipeline;
/// Prompt templates and rendering
pub mod prompt;

pub use error::{FieldError, PipelineError, StageError};
pub use feedback::FeedbackStage;
pub use grading::{Grade, GradingStage};
pub use lesson::LessonStage;
pub use moderation::{ModerationStage, Verdict};
pub use pipeline::{PipelineRequest, TutorPipeline, TutorReply};
pub use prompt::{PromptError, TutorPrompts, render};

//! # lingua-tutor
//!
//! A language-learning tutor service. A learner's answer is graded, the grade
//! is turned into prose feedback, and that feedback is moderated before it is
//! returned.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Environment-driven configuration
pub mod config;
/// Constant values used throughout
pub mod constants;
/// The text-completion provider boundary
pub mod provider;
/// HTTP routes and server startup
pub mod server;
/// Prompts, stages and the tutor pipeline
pub mod tutor;

pub use provider::{CompletionOptions, ProviderError, TextCompletionClient};
pub use tutor::{PipelineError, PipelineRequest, TutorPipeline, TutorReply};

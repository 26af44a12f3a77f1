#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Highest mark the grading stage may award.
pub const MAX_MARK: u8 = 10;

/// Lowest mark the grading stage may award.
pub const MIN_MARK: u8 = 1;

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";

/// Default model identifier used for every stage.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default sampling temperature for prose generation.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Sampling temperature used when asking for the structured grade.
pub const GRADING_TEMPERATURE: f32 = 0.2;

/// Token cap for the moderation verdict; it is a single word.
pub const MODERATION_MAX_TOKENS: u32 = 5;

/// Default per-call provider timeout, in seconds.
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;

/// Default port for the HTTP server.
pub const DEFAULT_PORT: u16 = 3000;

/// Default bind address for the HTTP server.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Returned when the feedback stage produces only whitespace.
pub const NO_FEEDBACK: &str = "No feedback available.";

/// Returned when the lesson generator produces only whitespace.
pub const NO_LESSON: &str = "No lesson available.";

/// Returned when the exercise generator produces only whitespace.
pub const NO_EXERCISE: &str = "No exercise available.";

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Environment-driven configuration.
//!
//! Everything is read once at startup and handed to the pipeline and server
//! explicitly; nothing here is global.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_openai::types::chat::ReasoningEffort;
use reqwest::Client;

use crate::{
    constants::{
        DEFAULT_HOST, DEFAULT_MODEL, DEFAULT_OPENAI_ENDPOINT, DEFAULT_PORT,
        DEFAULT_PROVIDER_TIMEOUT_SECS, DEFAULT_TEMPERATURE, GRADING_TEMPERATURE,
        MODERATION_MAX_TOKENS,
    },
    provider::{CompletionOptions, OpenAiCompletionClient},
};

/// Parses the optional reasoning-effort environment value into the OpenAI
/// enum. Unset or unrecognised values send no hint at all, since many chat
/// models reject the parameter.
fn parse_reasoning_effort(val: Option<String>) -> Option<ReasoningEffort> {
    match val?.trim().to_ascii_lowercase().as_str() {
        "low" => Some(ReasoningEffort::Low),
        "medium" => Some(ReasoningEffort::Medium),
        "high" => Some(ReasoningEffort::High),
        _ => None,
    }
}

/// OpenAI credentials and optional tuning parameters sourced from the
/// environment.
#[derive(Clone)]
pub struct OpenAiEnv {
    /// Base URL for the OpenAI-compatible API endpoint.
    api_base:         String,
    /// API key used to authenticate OpenAI requests.
    api_key:          String,
    /// Default model identifier for chat completions.
    model:            String,
    /// Default temperature for prose generation.
    temperature:      Option<f32>,
    /// Optional cap on generated tokens.
    max_tokens:       Option<u32>,
    /// Reasoning effort hint to send with requests, if any.
    reasoning_effort: Option<ReasoningEffort>,
}

impl std::fmt::Debug for OpenAiEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEnv")
            .field("api_base", &self.api_base)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl OpenAiEnv {
    /// Constructs an `OpenAiEnv` from explicit values.
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_base:         api_base.into(),
            api_key:          api_key.into(),
            model:            model.into(),
            temperature:      Some(DEFAULT_TEMPERATURE),
            max_tokens:       None,
            reasoning_effort: None,
        }
    }

    /// Construct an `OpenAiEnv` from environment variables. `OPENAI_API_KEY`
    /// is required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(non_empty_var)
    }

    /// Construct an `OpenAiEnv` from `lookup`, which returns the trimmed,
    /// non-blank value of a variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let Some(api_key) = lookup("OPENAI_API_KEY") else {
            bail!("OPENAI_API_KEY must be set to reach the completion provider");
        };

        let api_base =
            lookup("OPENAI_ENDPOINT").unwrap_or_else(|| DEFAULT_OPENAI_ENDPOINT.to_string());
        let model = lookup("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let temperature = match lookup("OPENAI_TEMPERATURE") {
            Some(raw) => Some(
                raw.parse::<f32>()
                    .with_context(|| format!("OPENAI_TEMPERATURE is not a number: `{raw}`"))?,
            ),
            None => Some(DEFAULT_TEMPERATURE),
        };
        let max_tokens = lookup("OPENAI_MAX_TOKENS")
            .map(|raw| {
                raw.parse::<u32>().with_context(|| {
                    format!("OPENAI_MAX_TOKENS is not a positive integer: `{raw}`")
                })
            })
            .transpose()?;
        let reasoning_effort = parse_reasoning_effort(lookup("OPENAI_REASONING_EFFORT"));

        Ok(Self {
            api_base,
            api_key,
            model,
            temperature,
            max_tokens,
            reasoning_effort,
        })
    }

    /// Returns a copy that sends `effort` as the reasoning hint.
    pub fn with_reasoning_effort(mut self, effort: ReasoningEffort) -> Self {
        self.reasoning_effort = Some(effort);
        self
    }

    /// Returns the API base URL used for OpenAI requests.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Returns the API key used for OpenAI requests.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Returns the default model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the configured temperature, if any.
    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    /// Returns the configured token cap, if any.
    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    /// Returns the reasoning effort hint, if configured.
    pub fn reasoning_effort(&self) -> Option<ReasoningEffort> {
        self.reasoning_effort.clone()
    }
}

/// Where the HTTP server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEnv {
    /// Interface to bind.
    host: String,
    /// TCP port to bind.
    port: u16,
}

impl Default for ServerEnv {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerEnv {
    /// Reads `TUTOR_HOST` and `PORT`, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let host = non_empty_var("TUTOR_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match non_empty_var("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT is not a valid port number: `{raw}`"))?,
            None => DEFAULT_PORT,
        };
        Ok(Self { host, port })
    }

    /// Returns a copy listening on `port` instead.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Returns the `host:port` pair to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Sampling options for each tutor stage.
///
/// Each stage can be overridden with `TUTOR_<STAGE>_MODEL`,
/// `TUTOR_<STAGE>_TEMPERATURE` and `TUTOR_<STAGE>_MAX_TOKENS`, where
/// `<STAGE>` is `GRADING`, `FEEDBACK`, `MODERATION` or `LESSON`.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOptions {
    /// Options for the grading call.
    pub grading:    CompletionOptions,
    /// Options for the feedback call.
    pub feedback:   CompletionOptions,
    /// Options for the moderation call.
    pub moderation: CompletionOptions,
    /// Options for lesson, exercise and ungraded feedback calls.
    pub lesson:     CompletionOptions,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            grading:    CompletionOptions::builder()
                .temperature(GRADING_TEMPERATURE)
                .build(),
            feedback:   CompletionOptions::default(),
            moderation: CompletionOptions::builder()
                .temperature(0.0)
                .max_tokens(MODERATION_MAX_TOKENS)
                .build(),
            lesson:     CompletionOptions::default(),
        }
    }
}

impl StageOptions {
    /// Reads per-stage overrides from the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(non_empty_var)
    }

    /// Applies the per-stage overrides found through `lookup` to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            grading:    stage_overrides("GRADING", defaults.grading, &lookup)?,
            feedback:   stage_overrides("FEEDBACK", defaults.feedback, &lookup)?,
            moderation: stage_overrides("MODERATION", defaults.moderation, &lookup)?,
            lesson:     stage_overrides("LESSON", defaults.lesson, &lookup)?,
        })
    }
}

/// Overrides fields of `options` from `TUTOR_<stage>_*` variables.
fn stage_overrides(
    stage: &str,
    mut options: CompletionOptions,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<CompletionOptions> {
    if let Some(model) = lookup(&format!("TUTOR_{stage}_MODEL")) {
        options.model = Some(model);
    }

    let name = format!("TUTOR_{stage}_TEMPERATURE");
    if let Some(raw) = lookup(&name) {
        options.temperature = Some(
            raw.parse::<f32>()
                .with_context(|| format!("{name} is not a number: `{raw}`"))?,
        );
    }

    let name = format!("TUTOR_{stage}_MAX_TOKENS");
    if let Some(raw) = lookup(&name) {
        options.max_tokens = Some(
            raw.parse::<u32>()
                .with_context(|| format!("{name} is not a positive integer: `{raw}`"))?,
        );
    }

    Ok(options)
}

/// Runtime configuration for the tutor service.
#[derive(Debug, Clone)]
pub struct TutorConfig {
    /// Provider credentials and defaults.
    openai:           OpenAiEnv,
    /// HTTP listener settings.
    server:           ServerEnv,
    /// Bound on each provider call.
    provider_timeout: Duration,
    /// Sampling options per stage.
    stages:           StageOptions,
}

impl TutorConfig {
    /// Construct a configuration by reading the process environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            openai:           OpenAiEnv::from_env()?,
            server:           ServerEnv::from_env()?,
            provider_timeout: read_timeout_secs(
                "TUTOR_PROVIDER_TIMEOUT_SECS",
                DEFAULT_PROVIDER_TIMEOUT_SECS,
            ),
            stages:           StageOptions::from_env()?,
        })
    }

    /// Returns the OpenAI configuration.
    pub fn openai(&self) -> &OpenAiEnv {
        &self.openai
    }

    /// Returns the server listener settings.
    pub fn server(&self) -> &ServerEnv {
        &self.server
    }

    /// Overrides the server listener settings.
    pub fn set_server(&mut self, server: ServerEnv) {
        self.server = server;
    }

    /// Returns the per-call provider timeout.
    pub fn provider_timeout(&self) -> Duration {
        self.provider_timeout
    }

    /// Returns the sampling options for each stage.
    pub fn stage_options(&self) -> &StageOptions {
        &self.stages
    }

    /// Builds the completion client described by this configuration.
    pub fn completion_client(&self) -> Result<OpenAiCompletionClient> {
        let http_client = Client::builder()
            // Avoid macOS dynamic store lookups that fail in sandboxed environments.
            .no_proxy()
            .build()
            .context("Failed to construct shared HTTP client")?;

        Ok(OpenAiCompletionClient::new(
            self.openai.clone(),
            http_client,
            self.provider_timeout,
        ))
    }
}

/// Returns the trimmed value of `name`, or `None` if unset or blank.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Parses an environment variable into a `Duration`, falling back to
/// `default_secs` when parsing fails or the variable is missing.
fn read_timeout_secs(env: &str, default_secs: u64) -> Duration {
    std::env::var(env)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default_secs))
}

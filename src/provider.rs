#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The text-completion boundary.
//!
//! Every stage talks to the model provider through [`TextCompletionClient`],
//! so tests can swap in scripted backends and the server can share one
//! OpenAI-compatible client across requests.

use std::{future::Future, sync::Arc, time::Duration};

use async_openai::{
    Client as OpenAIClient,
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use bon::Builder;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::OpenAiEnv;

/// Failures of the completion backend itself.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The OpenAI-compatible API returned an error or could not be reached.
    #[error("completion request failed: {0}")]
    Api(#[from] OpenAIError),
    /// The call did not finish within the configured timeout.
    #[error("completion request timed out after {0:?}")]
    Timeout(Duration),
    /// The provider answered without any content.
    #[error("completion response contained no content")]
    EmptyResponse,
    /// Any other backend failure.
    #[error("completion backend unavailable: {0}")]
    Unavailable(String),
}

/// Per-call sampling options.
#[derive(Debug, Clone, Default, PartialEq, Builder)]
#[builder(on(String, into))]
pub struct CompletionOptions {
    /// Overrides the client's default model.
    pub model:       Option<String>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Upper bound on generated tokens.
    pub max_tokens:  Option<u32>,
}

/// Given a rendered prompt, returns generated text or fails.
pub trait TextCompletionClient: Send + Sync {
    /// Sends `prompt` to the provider and returns the generated text.
    fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send;
}

impl<C: TextCompletionClient> TextCompletionClient for Arc<C> {
    fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send {
        (**self).complete(prompt, options)
    }
}

/// [`TextCompletionClient`] backed by an OpenAI-compatible chat-completions
/// endpoint.
#[derive(Clone)]
pub struct OpenAiCompletionClient {
    /// Underlying async-openai client.
    client:  OpenAIClient<OpenAIConfig>,
    /// Provider settings read from the environment.
    openai:  OpenAiEnv,
    /// Bound on each individual call.
    timeout: Duration,
}

impl OpenAiCompletionClient {
    /// Builds a client from the OpenAI environment, reusing `http_client` for
    /// all requests.
    pub fn new(openai: OpenAiEnv, http_client: reqwest::Client, timeout: Duration) -> Self {
        let client = OpenAIClient::with_config(
            OpenAIConfig::new()
                .with_api_base(openai.api_base())
                .with_api_key(openai.api_key()),
        )
        .with_http_client(http_client);

        Self {
            client,
            openai,
            timeout,
        }
    }

    /// Issues a single chat completion with `prompt` as the user message.
    async fn request(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, ProviderError> {
        let model = options
            .model
            .clone()
            .unwrap_or_else(|| self.openai.model().to_owned());

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.to_owned())
                .build()?
                .into(),
        ];

        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(model.clone()).messages(messages).n(1u8);

        if let Some(max_tokens) = options.max_tokens.or(self.openai.max_tokens()) {
            request.max_completion_tokens(max_tokens);
        }
        // Reasoning models reject `temperature`, so it is only sent without an
        // effort hint.
        match self.openai.reasoning_effort() {
            Some(effort) => {
                request.reasoning_effort(effort);
            }
            None => {
                if let Some(temperature) = options.temperature.or(self.openai.temperature()) {
                    request.temperature(temperature);
                }
            }
        }

        debug!(%model, prompt_len = prompt.len(), "Sending completion request");
        let response = self.client.chat().create(request.build()?).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ProviderError::EmptyResponse)
    }
}

impl TextCompletionClient for OpenAiCompletionClient {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, ProviderError> {
        match tokio::time::timeout(self.timeout, self.request(prompt, options)).await {
            Ok(result) => result.inspect_err(|e| error!("Completion request failed: {e}")),
            Err(_) => {
                error!(timeout = ?self.timeout, "Completion request timed out");
                Err(ProviderError::Timeout(self.timeout))
            }
        }
    }
}

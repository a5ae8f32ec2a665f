// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! OpenAI chat completions client
//!
//! Sends the prompt as a single user message and returns the first choice's
//! content unchanged. Interpretation of the text is left to the caller.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{Span, debug, info, instrument};
use url::Url;
use uuid::Uuid;

use crate::{
    LanguageModel,
    config::LlmConfig,
    error::{LlmError, LlmResult},
    transport::{Transport, endpoint},
};

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/";

/// OpenAI Chat Completion API request
#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

/// A single message in the chat conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI Chat Completion API response
#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    id: Option<String>,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

/// Token usage statistics
#[derive(Debug, Clone, Deserialize)]
struct TokenUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// OpenAI API client
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    transport: Transport,
    base_url: Url,
    model: String,
    timeout: Duration,
    temperature: Option<f32>,
}

impl OpenAiClient {
    /// Create a new OpenAI client
    pub fn new(config: &LlmConfig) -> LlmResult<Self> {
        config.validate()?;

        let api_key = config
            .resolved_api_key()
            .ok_or_else(|| LlmError::config("OpenAI API key cannot be empty"))?;

        let base_url = match &config.base_url {
            Some(url) => url.clone(),
            None => Url::parse(DEFAULT_API_URL)
                .map_err(|e| LlmError::config(format!("Invalid default API URL: {e}")))?,
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| LlmError::config(format!("Invalid API key format: {e}")))?,
        );

        let timeout = Duration::from_secs(config.timeout_seconds);
        let transport = Transport::new("openai", headers, timeout, config.max_retries)?;

        info!(
            "Created OpenAI client with base URL: {} and timeout: {}s",
            base_url, config.timeout_seconds
        );

        Ok(Self {
            transport,
            base_url,
            model: config.model_name().to_string(),
            timeout,
            temperature: config.temperature,
        })
    }

    /// Model identifier used for requests
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Configured request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Request a completion for a prompt
    #[instrument(skip(self, prompt), fields(model = %self.model, request_id))]
    pub async fn complete(&self, prompt: &str) -> LlmResult<String> {
        let request_id = Uuid::new_v4();
        Span::current().record("request_id", request_id.to_string());

        debug!(
            request_id = %request_id,
            prompt_length = prompt.len(),
            "Starting chat completion request"
        );

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(prompt.to_string()),
            }],
            temperature: self.temperature,
            stream: false,
        };

        let url = endpoint(&self.base_url, "chat/completions")?;
        let response_text = self.transport.post_json(&url, &request, request_id).await?;

        let completion: ChatCompletionResponse = serde_json::from_str(&response_text)
            .map_err(|e| LlmError::invalid_response(format!("Failed to parse response: {e}")))?;

        Self::extract_content(completion, request_id)
    }

    fn extract_content(completion: ChatCompletionResponse, request_id: Uuid) -> LlmResult<String> {
        if let Some(ref usage) = completion.usage {
            debug!(
                request_id = %request_id,
                completion_id = ?completion.id,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Token usage statistics"
            );
        }

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::invalid_response("No choices in completion response"))?;

        debug!(
            request_id = %request_id,
            finish_reason = ?choice.finish_reason,
            "Received response from OpenAI API"
        );

        choice
            .message
            .content
            .ok_or_else(|| LlmError::invalid_response("Completion choice has no content"))
    }
}

impl LanguageModel for OpenAiClient {
    async fn generate(&self, prompt: &str) -> LlmResult<String> {
        self.complete(prompt).await
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

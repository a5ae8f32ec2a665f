// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Google Gemini `generateContent` client

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
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

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/";
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

/// Gemini API client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    transport: Transport,
    base_url: Url,
    model: String,
    timeout: Duration,
    temperature: Option<f32>,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(config: &LlmConfig) -> LlmResult<Self> {
        config.validate()?;

        let api_key = config
            .resolved_api_key()
            .ok_or_else(|| LlmError::config("Gemini API key cannot be empty"))?;

        let base_url = match &config.base_url {
            Some(url) => url.clone(),
            None => Url::parse(DEFAULT_API_URL)
                .map_err(|e| LlmError::config(format!("Invalid default API URL: {e}")))?,
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            API_KEY_HEADER,
            HeaderValue::from_str(&api_key)
                .map_err(|e| LlmError::config(format!("Invalid API key format: {e}")))?,
        );

        let timeout = Duration::from_secs(config.timeout_seconds);
        let transport = Transport::new("gemini", headers, timeout, config.max_retries)?;

        info!(
            "Created Gemini client with base URL: {} and timeout: {}s",
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

    /// Generate content for a prompt
    #[instrument(skip(self, prompt), fields(model = %self.model, request_id))]
    pub async fn generate_content(&self, prompt: &str) -> LlmResult<String> {
        let request_id = Uuid::new_v4();
        Span::current().record("request_id", request_id.to_string());

        debug!(
            request_id = %request_id,
            prompt_length = prompt.len(),
            "Starting generateContent request"
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: self
                .temperature
                .map(|temperature| GenerationConfig { temperature }),
        };

        let url = endpoint(
            &self.base_url,
            &format!("v1beta/models/{}:generateContent", self.model),
        )?;
        let response_text = self.transport.post_json(&url, &request, request_id).await?;

        let response: GenerateContentResponse = serde_json::from_str(&response_text)
            .map_err(|e| LlmError::invalid_response(format!("Failed to parse response: {e}")))?;

        Self::extract_text(response, request_id)
    }

    /// Concatenate the text parts of the first candidate
    fn extract_text(response: GenerateContentResponse, request_id: Uuid) -> LlmResult<String> {
        if let Some(ref usage) = response.usage_metadata {
            debug!(
                request_id = %request_id,
                prompt_tokens = usage.prompt_token_count,
                completion_tokens = usage.candidates_token_count,
                total_tokens = usage.total_token_count,
                "Token usage statistics"
            );
        }

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::invalid_response("No candidates in response"))?;

        debug!(
            request_id = %request_id,
            finish_reason = ?candidate.finish_reason,
            "Received response from Gemini API"
        );

        let text: String = candidate
            .content
            .map(|content| content.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| part.text)
            .collect();

        if text.is_empty() {
            return Err(LlmError::invalid_response("Candidate has no text parts"));
        }

        Ok(text)
    }
}

impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> LlmResult<String> {
        self.generate_content(prompt).await
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

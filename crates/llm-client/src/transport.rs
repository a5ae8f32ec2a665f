// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP plumbing shared by the provider clients

use std::time::{Duration, Instant};

use reqwest::{
    Client, ClientBuilder,
    header::{CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::{Deserialize, Serialize};
use tokio_retry::{
    RetryIf,
    strategy::{ExponentialBackoff, jitter},
};
use tracing::{debug, error, warn};
use url::Url;
use uuid::Uuid;

use crate::error::{ErrorContext, LlmError, LlmResult};

/// Error envelope used by both OpenAI and Gemini
#[derive(Debug, Deserialize)]
struct ProviderErrorResponse {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
    #[serde(default)]
    r#type: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Retrying JSON-over-HTTP sender for one provider
#[derive(Debug, Clone)]
pub(crate) struct Transport {
    client: Client,
    provider: &'static str,
    max_retries: usize,
}

impl Transport {
    /// Build a client with the provider's auth headers and a request timeout
    pub(crate) fn new(
        provider: &'static str,
        mut headers: HeaderMap,
        timeout: Duration,
        max_retries: usize,
    ) -> LlmResult<Self> {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = ClientBuilder::new()
            .timeout(timeout)
            .default_headers(headers)
            .user_agent(concat!("llm-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LlmError::http(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            provider,
            max_retries,
        })
    }

    /// POST a JSON body and return the successful response text
    pub(crate) async fn post_json<B>(
        &self,
        url: &Url,
        body: &B,
        request_id: Uuid,
    ) -> LlmResult<String>
    where
        B: Serialize + Sync,
    {
        let retry_strategy = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(10))
            .take(self.max_retries)
            .map(jitter);

        let client = &self.client;
        let provider = self.provider;
        let start_time = Instant::now();

        let attempt = move || async move {
            debug!(
                request_id = %request_id,
                provider,
                url = %url,
                "Making API request attempt"
            );

            let response = client.post(url.clone()).json(body).send().await?;
            let status = response.status().as_u16();

            if should_retry_status(status) {
                warn!(
                    request_id = %request_id,
                    provider,
                    status,
                    "Request failed with retryable status, will retry"
                );

                let context = ErrorContext::new()
                    .with_request_id(request_id.to_string())
                    .with_provider(provider)
                    .with_metadata("status_code", status.to_string());
                let text = response.text().await.unwrap_or_default();
                return Err(match error_from_status(provider, status, &text) {
                    LlmError::Http { message } => LlmError::http_with_context(message, &context),
                    other => other,
                });
            }

            Ok(response)
        };
        let response = RetryIf::spawn(retry_strategy, attempt, LlmError::is_retryable).await?;

        let status = response.status().as_u16();
        let text = response.text().await?;

        debug!(
            request_id = %request_id,
            provider,
            status,
            duration_ms = start_time.elapsed().as_millis(),
            "API request completed"
        );

        if !(200..300).contains(&status) {
            return Err(error_from_status(provider, status, &text));
        }

        Ok(text)
    }
}

/// Determine if an HTTP status code should trigger a retry
pub(crate) fn should_retry_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}

/// Classify a non-success response
pub(crate) fn error_from_status(provider: &'static str, status: u16, body: &str) -> LlmError {
    if let Ok(parsed) = serde_json::from_str::<ProviderErrorResponse>(body) {
        let error_msg = format!(
            "{provider} API error ({status}): {} (type: {:?}, status: {:?})",
            parsed.error.message, parsed.error.r#type, parsed.error.status
        );
        error!("{}", error_msg);

        return match status {
            401 | 403 => LlmError::authentication(error_msg),
            429 => {
                let retry_after = if parsed.error.message.contains("rate limit") {
                    60
                } else {
                    30
                };
                LlmError::rate_limit(retry_after)
            }
            500..=599 => LlmError::service_unavailable(error_msg),
            _ => LlmError::provider(provider, error_msg),
        };
    }

    let error_msg = format!("HTTP {status} error: {body}");
    error!("{}", error_msg);

    match status {
        401 | 403 => LlmError::authentication(error_msg),
        429 => LlmError::rate_limit(60),
        500..=599 => LlmError::service_unavailable(error_msg),
        _ => LlmError::http(error_msg),
    }
}

/// Join a relative path onto a base URL, treating the base as a directory
pub(crate) fn endpoint(base_url: &Url, path: &str) -> LlmResult<Url> {
    let mut base_url = base_url.clone();
    if !base_url.path().ends_with('/') {
        base_url.set_path(&format!("{}/", base_url.path()));
    }
    base_url
        .join(path)
        .map_err(|e| LlmError::config(format!("Invalid base URL: {e}")))
}

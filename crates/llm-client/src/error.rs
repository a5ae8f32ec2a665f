// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for language model calls
//!
//! Every failure a caller can observe from a [`LanguageModel`](crate::LanguageModel)
//! is one of these variants. Callers in this workspace never surface them to
//! users; they decide between the model answer and a rule-based fallback.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type alias for language model operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Correlation data attached to transport errors
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Request ID for correlation across logs
    pub request_id: Option<String>,
    /// Provider that was being called
    pub provider: Option<String>,
    /// Timestamp when error occurred
    pub timestamp: Option<DateTime<Utc>>,
    /// Additional metadata
    pub metadata: HashMap<String, String>,
}

impl ErrorContext {
    /// Create new error context
    pub fn new() -> Self {
        Self {
            request_id: None,
            provider: None,
            timestamp: Some(Utc::now()),
            metadata: HashMap::new(),
        }
    }

    /// Set request ID for correlation
    pub fn with_request_id(mut self, request_id: String) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Set provider name
    pub fn with_provider(mut self, provider: &str) -> Self {
        self.provider = Some(provider.to_string());
        self
    }

    /// Add metadata key-value pair
    pub fn with_metadata(mut self, key: &str, value: String) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Failures of a language model call
#[derive(Debug, Error)]
pub enum LlmError {
    /// Client could not be configured
    #[error("Configuration error: {message}")]
    Configuration {
        /// What is wrong with the configuration
        message: String,
    },

    /// No provider is configured
    #[error("Language model is disabled")]
    Disabled,

    /// Provider returned an error payload
    #[error("{provider} API error: {message}")]
    Provider {
        /// Provider name
        provider: &'static str,
        /// Error reported by the provider
        message: String,
    },

    /// HTTP request failed
    #[error("HTTP request failed: {message}")]
    Http {
        /// Transport failure description
        message: String,
    },

    /// Authentication failed
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Provider response
        message: String,
    },

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after_seconds} seconds")]
    RateLimitExceeded {
        /// Suggested wait before the next attempt
        retry_after_seconds: u64,
    },

    /// Request timeout
    #[error("Request timeout after {timeout_seconds} seconds")]
    Timeout {
        /// Configured request timeout, 0 when unknown
        timeout_seconds: u64,
    },

    /// Response body did not have the expected shape
    #[error("Invalid response format: {message}")]
    InvalidResponse {
        /// Decoding failure
        message: String,
    },

    /// Service unavailable
    #[error("Service unavailable: {message}")]
    ServiceUnavailable {
        /// Provider response
        message: String,
    },
}

impl LlmError {
    /// Create a configuration error
    pub fn config<T: ToString>(message: T) -> Self {
        Self::Configuration {
            message: message.to_string(),
        }
    }

    /// Create a disabled error
    pub fn disabled() -> Self {
        Self::Disabled
    }

    /// Create a provider error
    pub fn provider<T: ToString>(provider: &'static str, message: T) -> Self {
        Self::Provider {
            provider,
            message: message.to_string(),
        }
    }

    /// Create an HTTP error
    pub fn http<T: ToString>(message: T) -> Self {
        Self::Http {
            message: message.to_string(),
        }
    }

    /// Create an authentication error
    pub fn authentication<T: ToString>(message: T) -> Self {
        Self::Authentication {
            message: message.to_string(),
        }
    }

    /// Create a rate limit error
    pub fn rate_limit(retry_after_seconds: u64) -> Self {
        Self::RateLimitExceeded {
            retry_after_seconds,
        }
    }

    /// Create a timeout error
    pub fn timeout(timeout_seconds: u64) -> Self {
        Self::Timeout { timeout_seconds }
    }

    /// Create an invalid response error
    pub fn invalid_response<T: ToString>(message: T) -> Self {
        Self::InvalidResponse {
            message: message.to_string(),
        }
    }

    /// Create a service unavailable error
    pub fn service_unavailable<T: ToString>(message: T) -> Self {
        Self::ServiceUnavailable {
            message: message.to_string(),
        }
    }

    /// Create an HTTP error with context
    pub fn http_with_context<T: ToString>(message: T, context: &ErrorContext) -> Self {
        let mut enhanced_message = message.to_string();

        if let Some(provider) = &context.provider {
            enhanced_message.push_str(&format!(" [provider: {provider}]"));
        }

        if let Some(request_id) = &context.request_id {
            enhanced_message.push_str(&format!(" [request_id: {request_id}]"));
        }

        Self::Http {
            message: enhanced_message,
        }
    }

    /// Check if this error indicates a temporary failure that could be retried
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::Http { .. }
                | LlmError::Timeout { .. }
                | LlmError::ServiceUnavailable { .. }
                | LlmError::RateLimitExceeded { .. }
        )
    }

    /// Check if this error indicates an authentication problem
    pub fn is_auth_error(&self) -> bool {
        matches!(self, LlmError::Authentication { .. })
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout { timeout_seconds: 0 };
        }

        match err.status().map(|s| s.as_u16()) {
            Some(401 | 403) => Self::Authentication {
                message: err.to_string(),
            },
            Some(429) => Self::RateLimitExceeded {
                retry_after_seconds: 60,
            },
            Some(status) if status >= 500 => Self::ServiceUnavailable {
                message: err.to_string(),
            },
            _ => Self::Http {
                message: err.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse {
            message: err.to_string(),
        }
    }
}

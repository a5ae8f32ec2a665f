// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Provider selection and client settings

use std::{env, fmt};

use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::error::{LlmError, LlmResult};

/// Hosted model provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Google Gemini
    #[default]
    Gemini,
    /// OpenAI chat completions
    #[serde(rename = "openai")]
    OpenAi,
    /// No model; every call fails and callers use their fallback
    Disabled,
}

impl LlmProvider {
    /// Lower-case provider name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Disabled => "disabled",
        }
    }

    /// Model used when none is configured
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.0-flash",
            Self::OpenAi => "gpt-4o-mini",
            Self::Disabled => "",
        }
    }

    /// Environment variable consulted when no API key is configured
    pub fn api_key_env_var(self) -> Option<&'static str> {
        match self {
            Self::Gemini => Some("GEMINI_API_KEY"),
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Disabled => None,
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings shared by all provider clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Which provider to call
    pub provider: LlmProvider,
    /// Model identifier; provider default when absent
    pub model: Option<String>,
    /// API key; empty means "look in the provider's environment variable"
    #[serde(skip_serializing)]
    pub api_key: String,
    /// Override for the provider's API base URL
    pub base_url: Option<Url>,
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
    /// Retries after the first attempt for transient failures
    pub max_retries: usize,
    /// Sampling temperature
    pub temperature: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: None,
            api_key: String::new(),
            base_url: None,
            timeout_seconds: 15,
            max_retries: 3,
            temperature: None,
        }
    }
}

impl LlmConfig {
    /// Create a configuration for a provider with an explicit key
    pub fn new(provider: LlmProvider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Configuration that never calls a model
    pub fn disabled() -> Self {
        Self {
            provider: LlmProvider::Disabled,
            ..Default::default()
        }
    }

    /// Set the model identifier
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the base URL for the provider API
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Set the number of retries for transient failures
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Model identifier to use for requests
    pub fn model_name(&self) -> &str {
        self.model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// API key from the configuration, or from the provider's environment variable
    pub fn resolved_api_key(&self) -> Option<String> {
        let key = self.api_key.trim();
        if !key.is_empty() {
            return Some(key.to_string());
        }

        self.provider
            .api_key_env_var()
            .and_then(|var| env::var(var).ok())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Validate the configuration
    pub fn validate(&self) -> LlmResult<()> {
        if self.timeout_seconds == 0 || self.timeout_seconds > 300 {
            return Err(LlmError::config(format!(
                "Invalid timeout: {} seconds (must be 1-300)",
                self.timeout_seconds
            )));
        }

        if self.max_retries > 10 {
            return Err(LlmError::config(format!(
                "Invalid max_retries: {} (must be 0-10)",
                self.max_retries
            )));
        }

        if let Some(temperature) = self.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(LlmError::config(format!(
                "Invalid temperature: {temperature} (must be 0.0-2.0)"
            )));
        }

        if self.provider == LlmProvider::OpenAi
            && let Some(key) = self.resolved_api_key()
            && !key.starts_with("sk-")
        {
            warn!("OpenAI API key doesn't match expected format (should start with 'sk-')");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = LlmConfig::default();
        assert_eq!(config.provider, LlmProvider::Gemini);
        assert_eq!(config.timeout_seconds, 15);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.model_name(), "gemini-2.0-flash");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn explicit_model_wins() {
        let config = LlmConfig::new(LlmProvider::OpenAi, "sk-test").with_model("gpt-4o");
        assert_eq!(config.model_name(), "gpt-4o");
        assert_eq!(config.resolved_api_key().as_deref(), Some("sk-test"));
    }

    #[test]
    fn disabled_has_no_key() {
        assert_eq!(LlmConfig::disabled().resolved_api_key(), None);
    }

    #[test]
    fn provider_deserializes_lowercase() {
        let provider: LlmProvider = serde_json::from_str("\"openai\"").unwrap();
        assert_eq!(provider, LlmProvider::OpenAi);

        let config: LlmConfig =
            serde_json::from_value(serde_json::json!({"provider": "disabled"})).unwrap();
        assert_eq!(config.provider, LlmProvider::Disabled);
        assert_eq!(config.timeout_seconds, 15);
    }

    #[test]
    fn validation_rejects_out_of_range_values() {
        assert!(LlmConfig::default().with_timeout(0).validate().is_err());
        assert!(LlmConfig::default().with_timeout(301).validate().is_err());
        assert!(LlmConfig::default().with_max_retries(11).validate().is_err());

        let mut config = LlmConfig::default();
        config.temperature = Some(2.5);
        assert!(config.validate().is_err());
    }
}

// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Runtime provider selection

use tracing::{info, warn};

use crate::{
    LanguageModel,
    config::{LlmConfig, LlmProvider},
    error::{LlmError, LlmResult},
    gemini::GeminiClient,
    openai::OpenAiClient,
};

/// The language model chosen by configuration
#[derive(Debug, Clone)]
pub enum LlmBackend {
    /// OpenAI chat completions
    OpenAi(OpenAiClient),
    /// Google Gemini
    Gemini(GeminiClient),
    /// No model configured; every call returns [`LlmError::Disabled`]
    Disabled,
}

impl LlmBackend {
    /// Build the backend described by a configuration
    ///
    /// A provider without a usable API key degrades to [`LlmBackend::Disabled`]
    /// so the service still answers from its rule-based fallbacks.
    pub fn from_config(config: &LlmConfig) -> LlmResult<Self> {
        if config.provider != LlmProvider::Disabled && config.resolved_api_key().is_none() {
            warn!(
                provider = %config.provider,
                "No API key configured, language model disabled"
            );
            return Ok(Self::Disabled);
        }

        let backend = match config.provider {
            LlmProvider::OpenAi => Self::OpenAi(OpenAiClient::new(config)?),
            LlmProvider::Gemini => Self::Gemini(GeminiClient::new(config)?),
            LlmProvider::Disabled => Self::Disabled,
        };

        info!(provider = backend.name(), "Language model backend ready");
        Ok(backend)
    }

    /// Check whether calls can reach a model
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

impl LanguageModel for LlmBackend {
    async fn generate(&self, prompt: &str) -> LlmResult<String> {
        match self {
            Self::OpenAi(client) => client.generate(prompt).await,
            Self::Gemini(client) => client.generate(prompt).await,
            Self::Disabled => Err(LlmError::disabled()),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::OpenAi(client) => client.name(),
            Self::Gemini(client) => client.name(),
            Self::Disabled => LlmProvider::Disabled.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_backend_always_fails() {
        let backend = LlmBackend::from_config(&LlmConfig::disabled()).unwrap();

        assert!(!backend.is_enabled());
        assert_eq!(backend.name(), "disabled");
        assert!(matches!(
            backend.generate("anything").await,
            Err(LlmError::Disabled)
        ));
    }

    #[test]
    fn explicit_key_selects_provider() {
        let config = LlmConfig::new(LlmProvider::OpenAi, "sk-test");
        let backend = LlmBackend::from_config(&config).unwrap();
        assert_eq!(backend.name(), "openai");

        let config = LlmConfig::new(LlmProvider::Gemini, "gemini-test");
        let backend = LlmBackend::from_config(&config).unwrap();
        assert_eq!(backend.name(), "gemini");
        assert!(backend.is_enabled());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = LlmConfig::new(LlmProvider::Gemini, "gemini-test").with_timeout(0);
        assert!(LlmBackend::from_config(&config).is_err());
    }
}

// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Text generation clients for hosted language models
//!
//! The agents only need one capability from a language model: turn a prompt
//! into text. This crate expresses that as the [`LanguageModel`] trait and
//! provides two HTTP implementations behind it.
//!
//! - [`openai`]: OpenAI chat completions
//! - [`gemini`]: Google Gemini `generateContent`
//! - [`backend`]: runtime selection between providers, including a disabled mode
//! - [`error`]: error types with retry and authentication classification
//!
//! Both clients retry transient failures (408, 429 and 5xx) with exponential
//! backoff and jitter, and tag every call with a request id for log correlation.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use llm_client::{LanguageModel, LlmBackend, LlmConfig, LlmProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LlmConfig::new(LlmProvider::Gemini, "your-api-key");
//! let model = LlmBackend::from_config(&config)?;
//!
//! let text = model.generate("Suggest a price range for a used bicycle").await?;
//! println!("{} answered: {text}", model.name());
//! # Ok(())
//! # }
//! ```

use std::future::Future;

pub mod backend;
pub mod config;
pub mod error;
pub mod gemini;
pub mod openai;
mod transport;

pub use backend::LlmBackend;
pub use config::{LlmConfig, LlmProvider};
pub use error::{LlmError, LlmResult};
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

/// A model that turns a prompt into free-form text
///
/// Implementations must be cheap to share across tasks; the agents hold them
/// behind an `Arc` and call [`generate`](LanguageModel::generate) concurrently.
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for the given prompt
    fn generate(&self, prompt: &str) -> impl Future<Output = LlmResult<String>> + Send;

    /// Short provider name used in logs and metrics
    fn name(&self) -> &'static str;
}

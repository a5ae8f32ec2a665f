// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Asking a language model for a JSON answer

use std::time::Duration;

use llm_client::LanguageModel;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::CompletionError;

/// Remove a markdown code fence around a completion
///
/// Models often wrap JSON in a fence such as ` ```json ... ``` `. The text is
/// trimmed; when it starts with a backtick fence every leading and trailing
/// backtick is removed, then the first occurrence of `json` anywhere in the
/// remainder is dropped and the result trimmed again. Text that does not start
/// with a fence is only trimmed.
pub fn strip_code_fences(text: &str) -> String {
    let text = text.trim();
    if !text.starts_with("```") {
        return text.to_string();
    }

    let inner = text.trim_matches('`');
    if inner.contains("json") {
        inner.replacen("json", "", 1).trim().to_string()
    } else {
        inner.to_string()
    }
}

/// Decode a completion into `T` after fence stripping
pub fn parse_completion<T: DeserializeOwned>(text: &str) -> Result<T, CompletionError> {
    let cleaned = strip_code_fences(text);
    serde_json::from_str(&cleaned).map_err(CompletionError::malformed)
}

/// Generate a completion within `limit` and decode it into `T`
pub async fn ask<M, T>(model: &M, prompt: &str, limit: Duration) -> Result<T, CompletionError>
where
    M: LanguageModel,
    T: DeserializeOwned,
{
    let text = tokio::time::timeout(limit, model.generate(prompt))
        .await
        .map_err(|_| CompletionError::TimedOut(limit))??;

    debug!(
        provider = model.name(),
        completion_length = text.len(),
        "Received completion"
    );

    parse_completion(&text)
}

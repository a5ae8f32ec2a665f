// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Chat moderation agent
//!
//! Cheap rules run first and short-circuit: a phone number or a spam keyword
//! decides the verdict without a model call. Otherwise the model classifies
//! the message, and if it cannot the message is let through as safe.

use std::{
    fmt,
    sync::{Arc, LazyLock},
    time::Duration,
};

use llm_client::LanguageModel;
use regex::Regex;
use serde::Deserialize;
use shared_types::{ModerationResult, ModerationStatus};
use tracing::{debug, info, instrument, warn};

use crate::{
    DEFAULT_LLM_TIMEOUT, LLM_REASON_PREFIX,
    completion::ask,
    decision::{DecisionSource, ModerationDecision},
    error::CompletionError,
    journal::{DecisionJournal, ModerationEntry},
};

/// Ten digits, optionally preceded by `+91` or `0` and one whitespace character
static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:\+91|0)?\s?\d{10}\b").expect("phone pattern is a valid regex")
});

/// Lower-case phrases that mark a message as spam
pub const SPAM_KEYWORDS: [&str; 6] = [
    "buy now",
    "free",
    "offer",
    "limited",
    "click here",
    "visit link",
];

const PHONE_REASON: &str = "Message contains a phone number.";
const SPAM_REASON: &str = "Message contains spam keywords.";
const DEFAULT_REASON: &str = "Defaulted to Safe (no issues found)";

/// Statuses the model is allowed to answer with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
enum ModelVerdict {
    Safe,
    Abusive,
    Spam,
}

impl From<ModelVerdict> for ModerationStatus {
    fn from(verdict: ModelVerdict) -> Self {
        match verdict {
            ModelVerdict::Safe => Self::Safe,
            ModelVerdict::Abusive => Self::Abusive,
            ModelVerdict::Spam => Self::Spam,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ModelAnswer {
    status: ModelVerdict,
    reason: String,
}

/// Check whether a message shares a phone number
pub fn contains_phone_number(message: &str) -> bool {
    PHONE_PATTERN.is_match(message)
}

/// Check whether a message contains a spam keyword, ignoring case
pub fn contains_spam_keyword(message: &str) -> bool {
    let lowered = message.to_lowercase();
    SPAM_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

/// Verdict from the deterministic rules, if any rule matches
pub fn rule_based_check(message: &str) -> Option<ModerationResult> {
    if contains_phone_number(message) {
        return Some(ModerationResult::new(
            ModerationStatus::PhoneNumber,
            PHONE_REASON,
        ));
    }

    if contains_spam_keyword(message) {
        return Some(ModerationResult::new(ModerationStatus::Spam, SPAM_REASON));
    }

    None
}

/// Prompt asking the model to classify a message
pub fn moderation_prompt(message: &str) -> String {
    format!(
        r#"You are a chat moderation agent for a marketplace.
Classify the following message into one of:
- Safe
- Abusive
- Spam

Message: "{message}"

Respond ONLY in JSON format:
{{
  "status": "Safe" | "Abusive" | "Spam",
  "reason": "short explanation"
}}"#
    )
}

/// Classifies chat messages between buyers and sellers
pub struct ModerationAgent<M> {
    model: Arc<M>,
    journal: Arc<dyn DecisionJournal>,
    llm_timeout: Duration,
}

impl<M> fmt::Debug for ModerationAgent<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModerationAgent")
            .field("llm_timeout", &self.llm_timeout)
            .finish_non_exhaustive()
    }
}

impl<M: LanguageModel> ModerationAgent<M> {
    /// Create an agent around a model and a journal
    pub fn new(model: Arc<M>, journal: Arc<dyn DecisionJournal>) -> Self {
        Self {
            model,
            journal,
            llm_timeout: DEFAULT_LLM_TIMEOUT,
        }
    }

    /// Bound on a single model call
    pub fn with_llm_timeout(mut self, llm_timeout: Duration) -> Self {
        self.llm_timeout = llm_timeout;
        self
    }

    /// Moderate a message; never fails and journals every verdict
    #[instrument(skip(self, message), fields(message_length = message.len(), provider = self.model.name()))]
    pub async fn moderate(&self, message: &str) -> ModerationDecision {
        let decision = self.decide(message).await;

        info!(
            status = decision.result.status.as_str(),
            source = decision.source.as_str(),
            "Message moderated"
        );

        let entry = ModerationEntry::new(message, decision.result.clone());
        if let Err(e) = self.journal.record_moderation(&entry) {
            warn!(error = %e, "Failed to journal moderation");
        }

        decision
    }

    async fn decide(&self, message: &str) -> ModerationDecision {
        if let Some(result) = rule_based_check(message) {
            return ModerationDecision {
                result,
                source: DecisionSource::Rules,
            };
        }

        match self.llm_moderation(message).await {
            Ok(answer) => ModerationDecision {
                result: ModerationResult::new(
                    answer.status.into(),
                    format!("{LLM_REASON_PREFIX}{}", answer.reason),
                ),
                source: DecisionSource::Llm,
            },
            Err(e) => {
                if e.is_disabled() {
                    debug!("Language model disabled, defaulting to Safe");
                } else {
                    warn!(error = %e, kind = e.kind(), "LLM moderation failed, defaulting to Safe");
                }
                ModerationDecision {
                    result: ModerationResult::new(ModerationStatus::Safe, DEFAULT_REASON),
                    source: DecisionSource::Default,
                }
            }
        }
    }

    async fn llm_moderation(&self, message: &str) -> Result<ModelAnswer, CompletionError> {
        ask(self.model.as_ref(), &moderation_prompt(message), self.llm_timeout).await
    }
}

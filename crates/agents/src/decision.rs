// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Agent outputs annotated with where the answer came from

use shared_types::{ModerationResult, PriceSuggestion};

/// Which stage of a pipeline produced the answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionSource {
    /// The language model answered
    Llm,
    /// A deterministic rule answered
    Rules,
    /// Nothing matched and the fail-open default was used
    Default,
}

impl DecisionSource {
    /// Label used for logs and metrics
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Llm => "llm",
            Self::Rules => "rules",
            Self::Default => "default",
        }
    }
}

/// A price suggestion and its provenance
#[derive(Debug, Clone, PartialEq)]
pub struct PriceDecision {
    /// Suggestion returned to the caller
    pub suggestion: PriceSuggestion,
    /// Stage that produced the range
    pub source: DecisionSource,
}

/// A moderation verdict and its provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationDecision {
    /// Verdict returned to the caller
    pub result: ModerationResult,
    /// Stage that produced the verdict
    pub source: DecisionSource,
}

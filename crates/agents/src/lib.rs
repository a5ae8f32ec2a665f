// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Marketplace decision agents
//!
//! Three agents answer the marketplace's questions. Two of them ask a language
//! model first and fall back to deterministic rules, so every call produces a
//! fully populated answer even when the model is down, slow or talking nonsense.
//!
//! - [`pricing`]: fair price range and fraud flag for a listing
//! - [`moderation`]: phone number, spam and abuse detection for chat messages
//! - [`recommendation`]: same-category similar listings from the [`catalog`]
//! - [`journal`]: append-only record of every price and moderation decision
//! - [`completion`]: turning model text into typed answers
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use agents::{Catalog, FileJournal, MarketplaceAgents};
//! use llm_client::{LlmBackend, LlmConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let model = Arc::new(LlmBackend::from_config(&LlmConfig::default())?);
//! let catalog = Arc::new(Catalog::from_csv_path("data/products.csv")?);
//! let journal = Arc::new(FileJournal::open("logs")?);
//!
//! let agents = MarketplaceAgents::new(model, catalog, journal);
//! let verdict = agents.moderation.moderate("Call me at 9876543210").await;
//! println!("{:?}", verdict.result.status);
//! # Ok(())
//! # }
//! ```

use std::{sync::Arc, time::Duration};

use llm_client::LanguageModel;

pub mod catalog;
pub mod completion;
pub mod decision;
pub mod error;
pub mod journal;
pub mod moderation;
pub mod pricing;
pub mod recommendation;

#[cfg(test)]
mod test_support;

pub use catalog::Catalog;
pub use decision::{DecisionSource, ModerationDecision, PriceDecision};
pub use error::{AgentError, AgentResult, CompletionError};
pub use journal::{DecisionJournal, FileJournal, ModerationEntry, NegotiationEntry};
pub use moderation::ModerationAgent;
pub use pricing::PriceAgent;
pub use recommendation::{DEFAULT_TOP_N, RecommendationAgent};

/// Marker prepended to reasons that came from the language model
pub const LLM_REASON_PREFIX: &str = "LLM + rule-based fallback: ";

/// Bound on a single model call unless configured otherwise
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(15);

/// The three agents sharing one model, catalog and journal
#[derive(Debug)]
pub struct MarketplaceAgents<M> {
    /// Price suggestions
    pub pricing: PriceAgent<M>,
    /// Chat moderation
    pub moderation: ModerationAgent<M>,
    /// Similar listings
    pub recommendation: RecommendationAgent,
    catalog: Arc<Catalog>,
}

impl<M: LanguageModel> MarketplaceAgents<M> {
    /// Wire the agents to shared collaborators
    pub fn new(model: Arc<M>, catalog: Arc<Catalog>, journal: Arc<dyn DecisionJournal>) -> Self {
        Self {
            pricing: PriceAgent::new(Arc::clone(&model), Arc::clone(&journal)),
            moderation: ModerationAgent::new(model, journal),
            recommendation: RecommendationAgent::new(Arc::clone(&catalog)),
            catalog,
        }
    }

    /// Bound every model call made by the agents
    pub fn with_llm_timeout(self, llm_timeout: Duration) -> Self {
        Self {
            pricing: self.pricing.with_llm_timeout(llm_timeout),
            moderation: self.moderation.with_llm_timeout(llm_timeout),
            ..self
        }
    }

    /// The catalog the agents read from
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

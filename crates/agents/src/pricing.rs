// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Price suggestion agent
//!
//! The model is asked for a fair range first. When it cannot give one, a
//! deterministic estimate based on condition and age is used instead. Either
//! way the asking price is then compared against the range to flag listings
//! that look mispriced.

use std::{fmt, sync::Arc, time::Duration};

use llm_client::LanguageModel;
use serde::Deserialize;
use shared_types::{Condition, FraudFlag, PriceSuggestion, Product};
use tracing::{debug, info, instrument, warn};

use crate::{
    DEFAULT_LLM_TIMEOUT, LLM_REASON_PREFIX,
    completion::ask,
    decision::{DecisionSource, PriceDecision},
    error::CompletionError,
    journal::{DecisionJournal, NegotiationEntry},
};

/// Asking price assumed by the rules when the product has none
pub const DEFAULT_ASKING_PRICE: f64 = 1000.0;

/// A price range with its explanation, as produced by the model or the rules
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PriceEstimate {
    /// Lower bound
    pub min_price: f64,
    /// Upper bound
    pub max_price: f64,
    /// Explanation
    pub reason: String,
}

impl PriceEstimate {
    /// Reject ranges that cannot be served
    fn validate(&self) -> Result<(), CompletionError> {
        for (name, value) in [("min_price", self.min_price), ("max_price", self.max_price)] {
            if !value.is_finite() || value < 0.0 {
                return Err(CompletionError::malformed(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        if self.min_price > self.max_price {
            return Err(CompletionError::malformed(format!(
                "min_price {} exceeds max_price {}",
                self.min_price, self.max_price
            )));
        }

        Ok(())
    }
}

/// Value retained for a condition, as a fraction of the asking price
pub fn condition_factor(condition: &Condition) -> f64 {
    match condition {
        Condition::LikeNew => 0.90,
        Condition::Good => 0.75,
        Condition::Fair => 0.60,
        Condition::Other(_) => 0.70,
    }
}

/// Age depreciation: half a percent per month, never below one half
pub fn depreciation(age_months: u32) -> f64 {
    (1.0 - f64::from(age_months) * 0.005).max(0.5)
}

/// Deterministic price range from condition and age
///
/// Bounds are five percent either side of the depreciated value, rounded to
/// whole units with ties going to the even neighbour.
pub fn rule_based_price(product: &Product) -> PriceEstimate {
    let asking_price = product.asking_price.unwrap_or(DEFAULT_ASKING_PRICE);
    let base_price =
        asking_price * condition_factor(&product.condition) * depreciation(product.age_months);

    PriceEstimate {
        min_price: (base_price * 0.95).round_ties_even(),
        max_price: (base_price * 1.05).round_ties_even(),
        reason: format!(
            "Rule-based: category {}, condition {}, age {} months.",
            product.category,
            product.condition.label(),
            product.age_months
        ),
    }
}

/// Compare an asking price against a suggested range
pub fn fraud_flag(asking_price: f64, min_price: f64, max_price: f64) -> FraudFlag {
    if asking_price > max_price * 1.5 {
        FraudFlag::SuspiciousHigh
    } else if asking_price < min_price * 0.5 {
        FraudFlag::SuspiciousLow
    } else {
        FraudFlag::Normal
    }
}

/// Prompt asking the model for a JSON price range
pub fn price_prompt(product: &Product) -> String {
    let asking_price = product
        .asking_price
        .map_or_else(|| "not specified".to_string(), |price| price.to_string());

    format!(
        r#"You are a second-hand marketplace expert.
Suggest a fair price range (min_price, max_price) for the following product.

Product details:
Title: {title}
Category: {category}
Brand: {brand}
Condition: {condition}
Age in months: {age}
Asking price: {asking_price}
Location: {location}

Respond ONLY with JSON in this exact format:
{{
  "min_price": number,
  "max_price": number,
  "reason": "short explanation here"
}}"#,
        title = product.title,
        category = product.category,
        brand = product.brand,
        condition = product.condition,
        age = product.age_months,
        location = product.location,
    )
}

/// Suggests fair price ranges and flags implausible asking prices
pub struct PriceAgent<M> {
    model: Arc<M>,
    journal: Arc<dyn DecisionJournal>,
    llm_timeout: Duration,
}

impl<M> fmt::Debug for PriceAgent<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriceAgent")
            .field("llm_timeout", &self.llm_timeout)
            .finish_non_exhaustive()
    }
}

impl<M: LanguageModel> PriceAgent<M> {
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

    /// Suggest a price range for a product
    ///
    /// Always returns a suggestion: model failures of any kind fall back to
    /// [`rule_based_price`]. The outcome is journaled under `product_id`.
    #[instrument(skip(self, product), fields(category = %product.category, provider = self.model.name()))]
    pub async fn suggest_price(&self, product: &Product, product_id: Option<u64>) -> PriceDecision {
        let (estimate, source) = match self.llm_price(product).await {
            Ok(estimate) => (
                PriceEstimate {
                    reason: format!("{LLM_REASON_PREFIX}{}", estimate.reason),
                    ..estimate
                },
                DecisionSource::Llm,
            ),
            Err(e) => {
                if e.is_disabled() {
                    debug!("Language model disabled, using rule-based price");
                } else {
                    warn!(error = %e, kind = e.kind(), "LLM price suggestion failed, using rules");
                }
                (rule_based_price(product), DecisionSource::Rules)
            }
        };

        // An absent asking price compares as zero, so any positive range flags it low.
        let flag = fraud_flag(
            product.asking_price.unwrap_or(0.0),
            estimate.min_price,
            estimate.max_price,
        );

        let suggestion = PriceSuggestion {
            min_price: estimate.min_price,
            max_price: estimate.max_price,
            reason: estimate.reason,
            fraud_flag: flag,
        };

        if flag.is_suspicious() {
            warn!(
                source = source.as_str(),
                asking_price = product.asking_price,
                min_price = suggestion.min_price,
                max_price = suggestion.max_price,
                fraud_flag = flag.as_str(),
                "Asking price flagged as suspicious"
            );
        } else {
            info!(
                source = source.as_str(),
                min_price = suggestion.min_price,
                max_price = suggestion.max_price,
                fraud_flag = flag.as_str(),
                "Price suggested"
            );
        }

        let entry = NegotiationEntry::new(product_id, product.clone(), suggestion.clone());
        if let Err(e) = self.journal.record_negotiation(&entry) {
            warn!(error = %e, "Failed to journal negotiation");
        }

        PriceDecision { suggestion, source }
    }

    async fn llm_price(&self, product: &Product) -> Result<PriceEstimate, CompletionError> {
        let estimate: PriceEstimate =
            ask(self.model.as_ref(), &price_prompt(product), self.llm_timeout).await?;
        estimate.validate()?;
        Ok(estimate)
    }
}

#[cfg(test)]
mod tests {
    use shared_types::{Condition, FraudFlag};

    use super::*;
    use crate::{
        error::AgentError,
        journal::MockDecisionJournal,
        test_support::{StubModel, iphone, permissive_journal},
    };

    fn product_with(condition: Condition, age_months: u32, asking_price: f64) -> Product {
        Product {
            condition,
            age_months,
            asking_price: Some(asking_price),
            ..iphone()
        }
    }

    #[test]
    fn condition_factors() {
        assert!((condition_factor(&Condition::LikeNew) - 0.90).abs() < f64::EPSILON);
        assert!((condition_factor(&Condition::Good) - 0.75).abs() < f64::EPSILON);
        assert!((condition_factor(&Condition::Fair) - 0.60).abs() < f64::EPSILON);
        assert!(
            (condition_factor(&Condition::Other("refurbished".into())) - 0.70).abs()
                < f64::EPSILON
        );
    }

    #[test]
    fn depreciation_has_a_floor() {
        assert!((depreciation(0) - 1.0).abs() < f64::EPSILON);
        assert!((depreciation(24) - 0.88).abs() < 1e-12);
        assert!((depreciation(100) - 0.5).abs() < f64::EPSILON);
        assert!((depreciation(240) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn rule_based_iphone() {
        let estimate = rule_based_price(&iphone());

        // 35000 * 0.75 * 0.88 = 23100
        assert!((estimate.min_price - 21945.0).abs() < f64::EPSILON);
        assert!((estimate.max_price - 24255.0).abs() < f64::EPSILON);
        assert_eq!(
            estimate.reason,
            "Rule-based: category Mobile, condition good, age 24 months."
        );
    }

    #[test]
    fn rule_based_range_is_ordered() {
        let conditions = [
            Condition::LikeNew,
            Condition::Good,
            Condition::Fair,
            Condition::Other("used".into()),
        ];
        for condition in conditions {
            for age in [0, 1, 12, 99, 100, 101, 500] {
                for price in [0.0, 1.0, 9.99, 1000.0, 123_456.78] {
                    let estimate = rule_based_price(&product_with(condition.clone(), age, price));
                    assert!(estimate.min_price <= estimate.max_price);
                }
            }
        }
    }

    #[test]
    fn rule_based_uses_default_asking_price() {
        let product = Product {
            asking_price: None,
            condition: Condition::Good,
            age_months: 12,
            ..iphone()
        };
        // 1000 * 0.75 * 0.94 = 705
        let estimate = rule_based_price(&product);
        assert!((estimate.min_price - 670.0).abs() < f64::EPSILON);
        assert!((estimate.max_price - 740.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fraud_flag_boundaries() {
        assert_eq!(fraud_flag(151.0, 0.0, 100.0), FraudFlag::SuspiciousHigh);
        assert_eq!(fraud_flag(150.0, 0.0, 100.0), FraudFlag::Normal);
        assert_eq!(fraud_flag(49.0, 100.0, 1000.0), FraudFlag::SuspiciousLow);
        assert_eq!(fraud_flag(50.0, 100.0, 1000.0), FraudFlag::Normal);
        assert_eq!(fraud_flag(120.0, 100.0, 150.0), FraudFlag::Normal);
    }

    #[test]
    fn prompt_embeds_every_field() {
        let prompt = price_prompt(&iphone());
        for expected in [
            "Title: iPhone 12",
            "Category: Mobile",
            "Brand: Apple",
            "Condition: good",
            "Age in months: 24",
            "Asking price: 35000",
            "Location: Mumbai",
            "\"min_price\": number",
        ] {
            assert!(prompt.contains(expected), "missing {expected}");
        }
    }

    #[tokio::test]
    async fn llm_answer_is_prefixed() {
        let model = StubModel::text(
            "```json\n{\"min_price\": 20000, \"max_price\": 26000, \"reason\": \"Typical resale.\"}\n```",
        );
        let agent = PriceAgent::new(model.clone(), permissive_journal());

        let decision = agent.suggest_price(&iphone(), None).await;

        assert_eq!(decision.source, DecisionSource::Llm);
        assert_eq!(
            decision.suggestion,
            PriceSuggestion {
                min_price: 20000.0,
                max_price: 26000.0,
                reason: "LLM + rule-based fallback: Typical resale.".to_string(),
                fraud_flag: FraudFlag::Normal,
            }
        );
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn llm_range_drives_fraud_flag() {
        let model =
            StubModel::text(r#"{"min_price": 1000, "max_price": 2000, "reason": "Old model."}"#);
        let agent = PriceAgent::new(model, permissive_journal());

        let decision = agent.suggest_price(&iphone(), None).await;
        assert_eq!(decision.suggestion.fraud_flag, FraudFlag::SuspiciousHigh);
    }

    #[tokio::test]
    async fn unavailable_model_falls_back_to_rules() {
        let agent = PriceAgent::new(StubModel::unavailable(), permissive_journal());
        let decision = agent.suggest_price(&iphone(), None).await;

        assert_eq!(decision.source, DecisionSource::Rules);
        assert_eq!(decision.suggestion.min_price, 21945.0);
        assert_eq!(decision.suggestion.fraud_flag, FraudFlag::Normal);
    }

    #[tokio::test]
    async fn malformed_answers_fall_back_to_rules() {
        for reply in [
            "I would say around 20k",
            r#"{"min_price": 20000, "reason": "missing max"}"#,
            r#"{"min_price": 30000, "max_price": 20000, "reason": "inverted"}"#,
            r#"{"min_price": -5, "max_price": 20000, "reason": "negative"}"#,
            r#"{"min_price": "cheap", "max_price": 20000, "reason": "text"}"#,
        ] {
            let agent = PriceAgent::new(StubModel::text(reply), permissive_journal());
            let decision = agent.suggest_price(&iphone(), None).await;

            assert_eq!(decision.source, DecisionSource::Rules, "reply {reply}");
            assert!(decision.suggestion.reason.starts_with("Rule-based:"));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_model_times_out_into_rules() {
        let agent = PriceAgent::new(StubModel::hanging(), permissive_journal())
            .with_llm_timeout(Duration::from_secs(2));

        let decision = agent.suggest_price(&iphone(), None).await;
        assert_eq!(decision.source, DecisionSource::Rules);
    }

    #[tokio::test]
    async fn missing_asking_price_is_flagged_low() {
        let product = Product {
            asking_price: None,
            ..iphone()
        };
        let agent = PriceAgent::new(StubModel::unavailable(), permissive_journal());

        let decision = agent.suggest_price(&product, None).await;
        assert_eq!(decision.suggestion.fraud_flag, FraudFlag::SuspiciousLow);
    }

    #[tokio::test]
    async fn deterministic_model_gives_identical_answers() {
        let model =
            StubModel::text(r#"{"min_price": 20000, "max_price": 26000, "reason": "Same."}"#);
        let agent = PriceAgent::new(model, permissive_journal());

        let first = agent.suggest_price(&iphone(), Some(1)).await;
        let second = agent.suggest_price(&iphone(), Some(1)).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn every_suggestion_is_journaled() {
        let mut journal = MockDecisionJournal::new();
        journal
            .expect_record_negotiation()
            .withf(|entry| {
                entry.product_id == Some(7)
                    && entry.input.title == "iPhone 12"
                    && entry.output.reason.starts_with("Rule-based:")
            })
            .times(1)
            .returning(|_| Ok(()));
        journal.expect_record_moderation().never();

        let agent = PriceAgent::new(StubModel::unavailable(), Arc::new(journal));
        agent.suggest_price(&iphone(), Some(7)).await;
    }

    #[tokio::test]
    async fn journal_failure_does_not_fail_suggestion() {
        let mut journal = MockDecisionJournal::new();
        journal
            .expect_record_negotiation()
            .times(1)
            .returning(|_| Err(AgentError::journal("disk full")));

        let agent = PriceAgent::new(StubModel::unavailable(), Arc::new(journal));
        let decision = agent.suggest_price(&iphone(), None).await;

        assert_eq!(decision.suggestion.max_price, 24255.0);
    }
}

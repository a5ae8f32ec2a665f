// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Similar-listing recommendations

use std::sync::Arc;

use shared_types::{CatalogEntry, Recommendation, RecommendationResult};
use tracing::{info, instrument};

use crate::{
    catalog::Catalog,
    error::{AgentError, AgentResult},
};

/// Number of recommendations returned when the caller does not ask for a count
pub const DEFAULT_TOP_N: usize = 3;

const MAX_AGE_GAP_MONTHS: u32 = 12;
const MAX_PRICE_GAP: f64 = 5000.0;

/// Similarity of a candidate to a target, from 0 to 4
///
/// Same brand scores 2, an age within a year scores 1, and an asking price
/// within 5000 scores 1.
pub fn similarity(target: &CatalogEntry, candidate: &CatalogEntry) -> u8 {
    let mut score = 0;
    if candidate.brand == target.brand {
        score += 2;
    }
    if candidate.age_months.abs_diff(target.age_months) <= MAX_AGE_GAP_MONTHS {
        score += 1;
    }
    if (candidate.asking_price - target.asking_price).abs() <= MAX_PRICE_GAP {
        score += 1;
    }
    score
}

/// Ranks catalog listings by similarity to a given listing
#[derive(Debug, Clone)]
pub struct RecommendationAgent {
    catalog: Arc<Catalog>,
}

impl RecommendationAgent {
    /// Create an agent over a shared catalog
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Recommend up to `top_n` listings in the same category as `product_id`
    ///
    /// Candidates are ordered by descending similarity; equal scores keep
    /// catalog order.
    #[instrument(skip(self))]
    pub fn recommend(&self, product_id: u64, top_n: usize) -> AgentResult<RecommendationResult> {
        let target = self
            .catalog
            .get(product_id)
            .ok_or_else(|| AgentError::not_found(product_id))?;

        let mut candidates: Vec<Recommendation> = self
            .catalog
            .entries()
            .iter()
            .filter(|entry| entry.category == target.category && entry.id != target.id)
            .map(|entry| Recommendation {
                similarity: similarity(target, entry),
                entry: entry.clone(),
            })
            .collect();

        candidates.sort_by(|a, b| b.similarity.cmp(&a.similarity));
        candidates.truncate(top_n);

        info!(
            category = %target.category,
            returned = candidates.len(),
            "Recommendations ranked"
        );

        Ok(RecommendationResult {
            product_id: target.id,
            title: target.title.clone(),
            recommendations: candidates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::entry;

    fn agent(entries: Vec<CatalogEntry>) -> RecommendationAgent {
        RecommendationAgent::new(Arc::new(Catalog::from_entries(entries).unwrap()))
    }

    #[test]
    fn scoring_rules() {
        let target = entry(1, "Mobile", "Apple", 24, 35000.0);

        assert_eq!(similarity(&target, &entry(2, "Mobile", "Apple", 20, 33000.0)), 4);
        assert_eq!(similarity(&target, &entry(3, "Mobile", "Apple", 40, 33000.0)), 3);
        assert_eq!(similarity(&target, &entry(4, "Mobile", "Samsung", 36, 40000.0)), 2);
        assert_eq!(similarity(&target, &entry(5, "Mobile", "Samsung", 37, 40001.0)), 0);
    }

    #[test]
    fn same_brand_near_neighbour_ranks_first() {
        let agent = agent(vec![
            entry(1, "Mobile", "Apple", 24, 35000.0),
            entry(2, "Mobile", "Samsung", 30, 36000.0),
            entry(3, "Mobile", "Apple", 20, 33000.0),
            entry(4, "Furniture", "Apple", 24, 35000.0),
            entry(5, "Mobile", "OnePlus", 60, 90000.0),
        ]);

        let result = agent.recommend(1, 3).unwrap();

        assert_eq!(result.product_id, 1);
        assert_eq!(result.title, "Apple item 1");

        let ranked: Vec<(u64, u8)> = result
            .recommendations
            .iter()
            .map(|r| (r.entry.id, r.similarity))
            .collect();
        assert_eq!(ranked, vec![(3, 4), (2, 2), (5, 0)]);
    }

    #[test]
    fn ties_keep_catalog_order() {
        let agent = agent(vec![
            entry(10, "Bikes", "Hero", 12, 8000.0),
            entry(11, "Bikes", "Atlas", 12, 8000.0),
            entry(12, "Bikes", "Btwin", 12, 8000.0),
            entry(13, "Bikes", "Avon", 12, 8000.0),
        ]);

        let ids: Vec<u64> = agent
            .recommend(10, 3)
            .unwrap()
            .recommendations
            .iter()
            .map(|r| r.entry.id)
            .collect();
        assert_eq!(ids, vec![11, 12, 13]);
    }

    #[test]
    fn top_n_limits_results() {
        let agent = agent(vec![
            entry(1, "Mobile", "Apple", 24, 35000.0),
            entry(2, "Mobile", "Apple", 24, 35000.0),
            entry(3, "Mobile", "Apple", 24, 35000.0),
        ]);

        assert_eq!(agent.recommend(1, 1).unwrap().recommendations.len(), 1);
        assert!(agent.recommend(1, 0).unwrap().recommendations.is_empty());
        assert_eq!(agent.recommend(1, 10).unwrap().recommendations.len(), 2);
    }

    #[test]
    fn unknown_product_is_not_found() {
        let agent = agent(vec![entry(1, "Mobile", "Apple", 24, 35000.0)]);

        let err = agent.recommend(999, DEFAULT_TOP_N).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Product with id 999 not found.");
    }

    #[test]
    fn lone_product_has_no_recommendations() {
        let agent = agent(vec![
            entry(1, "Mobile", "Apple", 24, 35000.0),
            entry(2, "Furniture", "Ikea", 24, 3000.0),
        ]);

        assert!(agent.recommend(1, 3).unwrap().recommendations.is_empty());
    }
}

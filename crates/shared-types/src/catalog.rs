// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Catalog and recommendation types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::product::{Condition, Product};

/// A listing in the reference catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CatalogEntry {
    /// Unique listing identifier
    #[schema(example = 1)]
    pub id: u64,
    /// Listing title
    pub title: String,
    /// Marketplace category
    pub category: String,
    /// Manufacturer or brand name
    pub brand: String,
    /// Item condition
    #[schema(value_type = String, example = "good")]
    pub condition: Condition,
    /// Age of the item in months
    pub age_months: u32,
    /// Price requested by the seller
    pub asking_price: f64,
    /// Seller location
    pub location: String,
}

impl CatalogEntry {
    /// Product view of this listing, as submitted for pricing
    pub fn to_product(&self) -> Product {
        Product {
            title: self.title.clone(),
            category: self.category.clone(),
            brand: self.brand.clone(),
            condition: self.condition.clone(),
            age_months: self.age_months,
            asking_price: Some(self.asking_price),
            location: self.location.clone(),
        }
    }
}

/// A similar listing with its similarity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Recommendation {
    /// The recommended listing
    #[serde(flatten)]
    pub entry: CatalogEntry,
    /// Similarity to the target listing, from 0 to 4
    #[schema(example = 4)]
    pub similarity: u8,
}

/// Ranked listings similar to a target listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecommendationResult {
    /// Identifier of the target listing
    pub product_id: u64,
    /// Title of the target listing
    pub title: String,
    /// Similar listings, best first
    pub recommendations: Vec<Recommendation>,
}

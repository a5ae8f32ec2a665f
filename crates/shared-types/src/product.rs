// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Product listing types

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Physical condition of a listed item
///
/// Parsing is lenient: matching is case-insensitive, `like new`, `like-new`
/// and `like_new` are all accepted, and any unrecognised label becomes
/// [`Condition::Other`] carrying the lower-cased label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Condition {
    /// Barely used, no visible wear
    LikeNew,
    /// Normal signs of use
    #[default]
    Good,
    /// Noticeable wear or minor defects
    Fair,
    /// Any other seller-provided label
    Other(String),
}

impl Condition {
    /// Lower-cased label used in reason texts and serialization
    pub fn label(&self) -> &str {
        match self {
            Self::LikeNew => "like new",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Other(label) => label,
        }
    }
}

impl From<&str> for Condition {
    fn from(value: &str) -> Self {
        let normalized = value.trim().to_lowercase();
        match normalized.as_str() {
            "like new" | "like-new" | "like_new" => Self::LikeNew,
            "good" => Self::Good,
            "fair" => Self::Fair,
            _ => Self::Other(normalized),
        }
    }
}

impl From<String> for Condition {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Condition> for String {
    fn from(value: Condition) -> Self {
        match value {
            Condition::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Age assumed when a listing does not state one
pub const DEFAULT_AGE_MONTHS: u32 = 12;

fn default_age_months() -> u32 {
    DEFAULT_AGE_MONTHS
}

/// A second-hand item offered for sale
///
/// `condition` defaults to good and `age_months` to [`DEFAULT_AGE_MONTHS`]
/// when omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    /// Listing title
    #[schema(example = "iPhone 12")]
    pub title: String,
    /// Marketplace category
    #[schema(example = "Mobile")]
    pub category: String,
    /// Manufacturer or brand name
    #[schema(example = "Apple")]
    pub brand: String,
    /// Item condition
    #[serde(default)]
    #[schema(value_type = String, example = "good")]
    pub condition: Condition,
    /// Age of the item in months
    #[serde(default = "default_age_months")]
    #[schema(example = 24)]
    pub age_months: u32,
    /// Price requested by the seller, absent when the seller did not state one
    #[serde(default)]
    #[schema(example = 35000.0)]
    pub asking_price: Option<f64>,
    /// Seller location
    #[schema(example = "Mumbai")]
    pub location: String,
}

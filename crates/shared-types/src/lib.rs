// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared types for the marketplace agents service
//!
//! This crate provides the records exchanged between the agents and the HTTP
//! layer, avoiding circular dependencies between the workspace crates.

pub mod catalog;
pub mod moderation;
pub mod pricing;
pub mod product;

pub use catalog::{CatalogEntry, Recommendation, RecommendationResult};
pub use moderation::{ModerationResult, ModerationStatus};
pub use pricing::{FraudFlag, PriceSuggestion};
pub use product::{Condition, DEFAULT_AGE_MONTHS, Product};

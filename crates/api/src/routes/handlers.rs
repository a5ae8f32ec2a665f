// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP request handlers module
//!
//! Handlers validate input at the HTTP boundary and hand it to the agents.
//! Price and moderation calls never fail once input is valid; the agents fall
//! back to their rules instead.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use shared_types::{
    CatalogEntry, ModerationResult, PriceSuggestion, Product, RecommendationResult,
};
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{ServerError, ServerResult},
    extractors::JsonExtractor,
    metrics,
    state::{HealthCheck, ServerState},
};

/// Health check endpoint handler
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    summary = "Health check endpoint",
    description = "Returns the current health status of the service including version, environment, the language model provider answering first and the catalog size.",
    responses(
        (status = 200, description = "Service is answering", body = HealthCheck)
    )
)]
pub async fn health_handler(State(state): State<ServerState>) -> Json<HealthCheck> {
    Json(state.health_check())
}

/// Chat message to moderate
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ModerateRequest {
    /// Message text as typed by the buyer or seller
    #[schema(example = "Call me at 9876543210")]
    pub message: String,
}

/// Price suggestion for a catalog listing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CatalogPriceResponse {
    /// Listing that was priced
    pub product: CatalogEntry,
    /// Suggested range and fraud flag
    pub suggestion: PriceSuggestion,
}

/// Query parameters for recommendations
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecommendQuery {
    /// Maximum number of recommendations; server default when absent
    pub top_n: Option<usize>,
}

/// Reject products the price pipeline cannot reason about
fn validate_product(product: &Product) -> ServerResult<()> {
    if product.title.trim().is_empty() {
        return Err(ServerError::ValidationError(
            "title cannot be empty".to_string(),
        ));
    }
    if product.category.trim().is_empty() {
        return Err(ServerError::ValidationError(
            "category cannot be empty".to_string(),
        ));
    }
    match product.asking_price {
        Some(price) if price.is_finite() && price > 0.0 => Ok(()),
        Some(price) => Err(ServerError::ValidationError(format!(
            "asking_price must be a positive number, got {price}"
        ))),
        None => Err(ServerError::ValidationError(
            "asking_price is required".to_string(),
        )),
    }
}

/// Price suggestion for a listing
///
/// # Errors
///
/// Returns `ServerError::ValidationError` for an empty title or category or
/// a missing or non-positive asking price.
#[utoipa::path(
    post,
    path = "/negotiate",
    tag = "pricing",
    summary = "Suggest a fair price range",
    description = "Suggests a fair price range for a listing and flags asking prices far outside it. The language model is asked first; rule-based depreciation answers when it is unavailable, slow or malformed.",
    request_body = Product,
    responses(
        (status = 200, description = "Price range suggested", body = PriceSuggestion),
        (status = 400, description = "Invalid product", body = String)
    )
)]
pub async fn negotiate_handler(
    State(state): State<ServerState>,
    JsonExtractor(product): JsonExtractor<Product>,
) -> ServerResult<Json<PriceSuggestion>> {
    validate_product(&product)?;

    let decision = state.agents().pricing.suggest_price(&product, None).await;
    metrics::record_price_decision(&decision);

    Ok(Json(decision.suggestion))
}

/// Price suggestion for a catalog listing
///
/// # Errors
///
/// Returns `ServerError::NotFound` if no listing has `product_id`.
#[utoipa::path(
    get,
    path = "/negotiate/{product_id}",
    tag = "pricing",
    summary = "Suggest a price for a catalog listing",
    description = "Looks up a listing in the catalog and suggests a price range for it.",
    params(("product_id" = u64, Path, description = "Catalog listing identifier")),
    responses(
        (status = 200, description = "Price range suggested", body = CatalogPriceResponse),
        (status = 404, description = "Unknown listing", body = String)
    )
)]
pub async fn negotiate_catalog_handler(
    State(state): State<ServerState>,
    Path(product_id): Path<u64>,
) -> ServerResult<Json<CatalogPriceResponse>> {
    let agents = state.agents();
    let entry = agents
        .catalog()
        .get(product_id)
        .cloned()
        .ok_or(ServerError::NotFound { product_id })?;

    let decision = agents
        .pricing
        .suggest_price(&entry.to_product(), Some(product_id))
        .await;
    metrics::record_price_decision(&decision);

    Ok(Json(CatalogPriceResponse {
        product: entry,
        suggestion: decision.suggestion,
    }))
}

/// Chat message moderation
///
/// # Errors
///
/// Returns `ServerError::ValidationError` for an empty message.
#[utoipa::path(
    post,
    path = "/moderate",
    tag = "moderation",
    summary = "Moderate a chat message",
    description = "Flags phone numbers and spam keywords with deterministic rules, then asks the language model to spot abuse. Messages the model cannot classify are let through as safe.",
    request_body = ModerateRequest,
    responses(
        (status = 200, description = "Message moderated", body = ModerationResult),
        (status = 400, description = "Empty message", body = String)
    )
)]
pub async fn moderate_handler(
    State(state): State<ServerState>,
    JsonExtractor(request): JsonExtractor<ModerateRequest>,
) -> ServerResult<Json<ModerationResult>> {
    if request.message.trim().is_empty() {
        return Err(ServerError::ValidationError(
            "message cannot be empty".to_string(),
        ));
    }

    let decision = state.agents().moderation.moderate(&request.message).await;
    metrics::record_moderation_decision(&decision);

    Ok(Json(decision.result))
}

/// Similar listings
///
/// # Errors
///
/// Returns `ServerError::NotFound` if no listing has `product_id`.
#[utoipa::path(
    get,
    path = "/recommend/{product_id}",
    tag = "recommendations",
    summary = "Recommend similar listings",
    description = "Ranks listings in the same category by brand, age and price similarity.",
    params(
        ("product_id" = u64, Path, description = "Catalog listing identifier"),
        RecommendQuery
    ),
    responses(
        (status = 200, description = "Recommendations ranked", body = RecommendationResult),
        (status = 404, description = "Unknown listing", body = String)
    )
)]
pub async fn recommend_handler(
    State(state): State<ServerState>,
    Path(product_id): Path<u64>,
    Query(query): Query<RecommendQuery>,
) -> ServerResult<Json<RecommendationResult>> {
    let top_n = query.top_n.unwrap_or(state.config().recommendation_top_n);

    match state.agents().recommendation.recommend(product_id, top_n) {
        Ok(result) => {
            metrics::record_recommendation_lookup("found");
            Ok(Json(result))
        }
        Err(e) => {
            if e.is_not_found() {
                metrics::record_recommendation_lookup("not_found");
            }
            debug!(product_id, error = %e, "Recommendation lookup failed");
            Err(e.into())
        }
    }
}

/// First listing in the catalog
///
/// # Errors
///
/// Returns `ServerError::EmptyCatalog` if the catalog has no listings.
#[utoipa::path(
    get,
    path = "/sample-product",
    tag = "recommendations",
    summary = "Sample catalog listing",
    description = "Returns the first listing in the catalog, handy for trying the other endpoints.",
    responses(
        (status = 200, description = "First listing", body = CatalogEntry),
        (status = 404, description = "Catalog is empty", body = String)
    )
)]
pub async fn sample_product_handler(
    State(state): State<ServerState>,
) -> ServerResult<Json<CatalogEntry>> {
    let entry = state
        .agents()
        .catalog()
        .first()
        .cloned()
        .ok_or(ServerError::EmptyCatalog)?;

    info!(product_id = entry.id, "Sample product served");
    Ok(Json(entry))
}

#[cfg(test)]
mod tests {
    use shared_types::Condition;

    use super::*;

    fn product(title: &str, category: &str, asking_price: Option<f64>) -> Product {
        Product {
            title: title.to_string(),
            category: category.to_string(),
            brand: "Apple".to_string(),
            condition: Condition::Good,
            age_months: 24,
            asking_price,
            location: "Mumbai".to_string(),
        }
    }

    #[test]
    fn valid_product_passes() {
        assert!(validate_product(&product("iPhone 12", "Mobile", Some(35000.0))).is_ok());
    }

    #[test]
    fn blank_fields_are_rejected() {
        let err = validate_product(&product("  ", "Mobile", Some(1.0))).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: title cannot be empty");

        let err = validate_product(&product("iPhone 12", "", Some(1.0))).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: category cannot be empty");
    }

    #[test]
    fn asking_price_must_be_positive_and_present() {
        for price in [Some(0.0), Some(-5.0), Some(f64::NAN), Some(f64::INFINITY), None] {
            let err = validate_product(&product("iPhone 12", "Mobile", price)).unwrap_err();
            assert!(matches!(err, ServerError::ValidationError(_)), "{price:?}");
        }
    }
}

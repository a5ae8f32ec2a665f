// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `OpenAPI` document for the marketplace API

use shared_types::{
    CatalogEntry, FraudFlag, ModerationResult, ModerationStatus, PriceSuggestion, Product,
    Recommendation, RecommendationResult,
};
use utoipa::OpenApi;

use crate::{
    config::Environment,
    routes::handlers::{self, CatalogPriceResponse, ModerateRequest},
    state::{HealthCheck, HealthStatus},
};

/// `OpenAPI` description of every public endpoint
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "Marketplace Agents API",
        description = "Price suggestions, chat moderation and recommendations for a second-hand marketplace. Language model answers fall back to deterministic rules."
    ),
    paths(
        handlers::health_handler,
        handlers::negotiate_handler,
        handlers::negotiate_catalog_handler,
        handlers::moderate_handler,
        handlers::recommend_handler,
        handlers::sample_product_handler,
    ),
    components(schemas(
        HealthCheck,
        HealthStatus,
        Environment,
        Product,
        PriceSuggestion,
        FraudFlag,
        CatalogEntry,
        CatalogPriceResponse,
        ModerateRequest,
        ModerationResult,
        ModerationStatus,
        Recommendation,
        RecommendationResult,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "pricing", description = "Price suggestions and fraud flags"),
        (name = "moderation", description = "Chat message moderation"),
        (name = "recommendations", description = "Catalog browsing and similar listings"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_endpoint() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for path in [
            "/health",
            "/negotiate",
            "/negotiate/{product_id}",
            "/moderate",
            "/recommend/{product_id}",
            "/sample-product",
        ] {
            assert!(paths.contains(&path), "missing {path}");
        }
    }
}

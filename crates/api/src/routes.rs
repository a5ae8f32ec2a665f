// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Routes module
//!
//! This module provides route configuration for the marketplace API server.

pub mod handlers;

use axum::{
    Router,
    routing::{get, post},
};
use handlers::{
    health_handler, moderate_handler, negotiate_catalog_handler, negotiate_handler,
    recommend_handler, sample_product_handler,
};

use crate::{
    metrics::metrics_handler,
    openapi::{openapi_spec, swagger_ui},
    state::ServerState,
};

/// Create application routes
pub fn create_routes() -> Router<ServerState> {
    let ops_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler));

    let docs_routes = Router::new()
        .route("/api-doc/openapi.json", get(openapi_spec))
        .route("/swagger-ui", get(swagger_ui));

    let api_routes = Router::new()
        .route("/negotiate", post(negotiate_handler))
        .route("/negotiate/{product_id}", get(negotiate_catalog_handler))
        .route("/moderate", post(moderate_handler))
        .route("/recommend/{product_id}", get(recommend_handler))
        .route("/sample-product", get(sample_product_handler));

    Router::new()
        .merge(ops_routes)
        .merge(docs_routes)
        .merge(api_routes)
}

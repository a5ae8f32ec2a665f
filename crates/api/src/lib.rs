// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Marketplace API Server Implementation
//!
//! This crate provides the HTTP server in front of the marketplace agents,
//! built with Axum with hierarchical configuration, request tracing and
//! graceful shutdown.
//!
//! # Module Structure
//!
//! - [`config`]: Server configuration and environment management with hierarchical loading
//! - [`error`]: Error types and HTTP response handling with proper status codes
//! - [`extractors`]: JSON body extraction with readable rejection messages
//! - [`state`]: Shared application state holding the agents and the cancellation token
//! - [`server`]: Dependency wiring, server lifecycle and coordinated shutdown
//! - [`routes`]: Route configuration and HTTP request handlers
//! - [`metrics`]: Prometheus counters and the metered language model wrapper
//! - [`docs`], [`openapi`]: `OpenAPI` document and Swagger UI endpoints
//!
//! # Key Features
//!
//! - **Always answers**: price and moderation requests fall back to rules when the model fails
//! - **Decision journal**: every price and moderation verdict is appended to CSV and JSON-lines files
//! - **Graceful Shutdown**: coordinated termination using `CancellationToken` with a drain timeout
//! - **Observability**: request ids, tracing spans and Prometheus metrics

pub mod config;
pub mod docs;
pub mod error;
pub mod extractors;
pub mod metrics;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{Environment, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use metrics::MeteredModel;
pub use server::{Server, ShutdownConfig};
pub use state::{HealthCheck, ServerModel, ServerState};

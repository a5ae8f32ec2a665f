// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error handling module
//!
//! This module provides error types for server operations, including HTTP
//! response mapping and error propagation.

use std::net::SocketAddr;

use agents::AgentError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Error types for server operations
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Network binding errors
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        /// Socket address that failed to bind
        address: SocketAddr,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server startup errors
    #[error("Server startup failed: {source}")]
    Startup {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server shutdown errors
    #[error("Server shutdown failed: {source}")]
    Shutdown {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Catalog, journal or model backend could not be prepared
    #[error("Dependency error: {message}")]
    Dependency {
        /// Error message
        message: String,
    },

    /// Task join errors for async operations
    #[error("Task join error: {source}")]
    TaskJoin {
        /// Underlying tokio join error
        #[source]
        source: tokio::task::JoinError,
    },

    /// Input validation errors
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// JSON parsing errors with detailed context
    #[error("Invalid JSON request: {message}")]
    JsonError {
        /// Detailed error message
        message: String,
    },

    /// The requested catalog entry does not exist
    #[error("Product with id {product_id} not found.")]
    NotFound {
        /// Identifier that was looked up
        product_id: u64,
    },

    /// The catalog has no entries to show
    #[error("Catalog is empty.")]
    EmptyCatalog,
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// Create a dependency error
    pub fn dependency<T: ToString>(message: T) -> Self {
        Self::Dependency {
            message: message.to_string(),
        }
    }

    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Config { .. }
            | ServerError::Bind { .. }
            | ServerError::Startup { .. }
            | ServerError::Shutdown { .. }
            | ServerError::TaskJoin { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Dependency { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::ValidationError(..) | ServerError::JsonError { .. } => {
                StatusCode::BAD_REQUEST
            }
            ServerError::NotFound { .. } | ServerError::EmptyCatalog => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));
        (status, body).into_response()
    }
}

impl From<AgentError> for ServerError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::NotFound { product_id } => Self::NotFound { product_id },
            other => Self::dependency(other),
        }
    }
}

/// Convenient From implementations for common async error types
impl From<tokio::task::JoinError> for ServerError {
    fn from(source: tokio::task::JoinError) -> Self {
        Self::TaskJoin { source }
    }
}

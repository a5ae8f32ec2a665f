// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for the agents
//!
//! Two families live here. [`AgentError`] covers failures the caller must
//! handle (unknown products, unreadable catalog, journal I/O). [`CompletionError`]
//! covers a failed model attempt; the agents turn it into a fallback and it
//! never reaches a caller.

use std::time::Duration;

use llm_client::LlmError;
use thiserror::Error;

/// Result type alias for agent operations
pub type AgentResult<T> = Result<T, AgentError>;

/// Failures surfaced by the agents and their collaborators
#[derive(Debug, Error)]
pub enum AgentError {
    /// Catalog could not be loaded
    #[error("Catalog error: {message}")]
    Catalog {
        /// What went wrong while loading
        message: String,
    },

    /// Journal could not be written or read
    #[error("Journal error: {message}")]
    Journal {
        /// What went wrong while appending or reading
        message: String,
    },

    /// No catalog entry with the requested id
    #[error("Product with id {product_id} not found.")]
    NotFound {
        /// Requested product id
        product_id: u64,
    },

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    /// Create a catalog error
    pub fn catalog<T: ToString>(message: T) -> Self {
        Self::Catalog {
            message: message.to_string(),
        }
    }

    /// Create a journal error
    pub fn journal<T: ToString>(message: T) -> Self {
        Self::Journal {
            message: message.to_string(),
        }
    }

    /// Create a not found error
    pub fn not_found(product_id: u64) -> Self {
        Self::NotFound { product_id }
    }

    /// Check if this error means the requested product does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Why a model attempt produced no usable answer
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Transport, authentication, provider or disabled-backend failure
    #[error("language model unavailable: {0}")]
    Unavailable(#[from] LlmError),

    /// The call did not finish within the configured bound
    #[error("language model timed out after {0:?}")]
    TimedOut(Duration),

    /// The text could not be decoded into the expected answer
    #[error("malformed completion: {0}")]
    Malformed(String),
}

impl CompletionError {
    /// Create a malformed completion error
    pub fn malformed<T: ToString>(message: T) -> Self {
        Self::Malformed(message.to_string())
    }

    /// Check if the attempt failed only because no model is configured
    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Unavailable(LlmError::Disabled))
    }

    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable(e) if e.is_auth_error() => "unauthorized",
            Self::Unavailable(_) => "unavailable",
            Self::TimedOut(_) => "timeout",
            Self::Malformed(_) => "malformed",
        }
    }
}

// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server state management module
//!
//! This module provides shared application state for the marketplace API server,
//! including configuration, the decision agents, and coordinated cancellation.

use std::sync::Arc;

use agents::MarketplaceAgents;
use llm_client::{LanguageModel, LlmBackend};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use crate::{
    config::{Environment, ServerConfig},
    metrics::MeteredModel,
};

/// Model type the server runs its agents on
pub type ServerModel = MeteredModel<LlmBackend>;

/// Shared application state with cancellation token support
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Server configuration
    config: ServerConfig,
    /// Price, moderation and recommendation agents
    agents: Arc<MarketplaceAgents<ServerModel>>,
    /// Provider name reported by health checks
    llm_provider: &'static str,
    /// Cancellation token for coordinated shutdown
    pub cancellation_token: CancellationToken,
}

impl ServerState {
    /// Create new server state
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `model` - Language model shared by the agents
    /// * `agents` - Agents built around `model`
    /// * `cancellation_token` - Token for coordinated cancellation
    pub fn new(
        config: ServerConfig,
        model: &ServerModel,
        agents: Arc<MarketplaceAgents<ServerModel>>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            config,
            agents,
            llm_provider: model.name(),
            cancellation_token,
        }
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The decision agents
    pub fn agents(&self) -> &MarketplaceAgents<ServerModel> {
        &self.agents
    }

    /// Report service health
    ///
    /// The service answers from its rules without a model, so a disabled model
    /// only degrades it. An empty catalog leaves recommendations and sample
    /// products unusable and is reported the same way.
    pub fn health_check(&self) -> HealthCheck {
        let catalog_size = self.agents.catalog().len();

        let status = if catalog_size == 0 {
            HealthStatus::Degraded {
                reason: Box::from("product catalog is empty"),
            }
        } else if self.llm_provider == "disabled" {
            HealthStatus::Degraded {
                reason: Box::from("language model disabled, serving rule-based answers"),
            }
        } else {
            HealthStatus::Up
        };

        HealthCheck {
            status,
            version: Box::from(env!("CARGO_PKG_VERSION")),
            environment: self.config.environment,
            timestamp: chrono::Utc::now().to_rfc3339(),
            llm_provider: Box::from(self.llm_provider),
            catalog_size,
        }
    }
}

/// Health status of the service
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum HealthStatus {
    /// Service is fully operational
    Up,

    /// Service answers, but with reduced capability
    Degraded {
        /// Human-readable explanation of the degradation condition
        reason: Box<str>,
    },
}

/// Health check status
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthCheck {
    /// Service status
    pub status: HealthStatus,
    /// Service version
    #[schema(value_type = String)]
    pub version: Box<str>,
    /// Environment
    pub environment: Environment,
    /// Timestamp
    pub timestamp: String,
    /// Language model provider answering first, or `disabled`
    #[schema(value_type = String, example = "gemini")]
    pub llm_provider: Box<str>,
    /// Number of listings in the catalog
    pub catalog_size: usize,
}

#[cfg(test)]
mod tests {
    use agents::{Catalog, FileJournal};
    use shared_types::{CatalogEntry, Condition};
    use tempfile::TempDir;

    use super::*;

    fn state(entries: Vec<CatalogEntry>, token: CancellationToken) -> (ServerState, TempDir) {
        let dir = TempDir::new().unwrap();
        let model = MeteredModel::new(LlmBackend::Disabled);
        let agents = MarketplaceAgents::new(
            Arc::new(model.clone()),
            Arc::new(Catalog::from_entries(entries).unwrap()),
            Arc::new(FileJournal::open(dir.path()).unwrap()),
        );
        let state = ServerState::new(ServerConfig::for_testing(), &model, Arc::new(agents), token);
        (state, dir)
    }

    fn sofa() -> CatalogEntry {
        CatalogEntry {
            id: 1,
            title: "Three-seater sofa".to_string(),
            category: "Furniture".to_string(),
            brand: "Ikea".to_string(),
            condition: Condition::Good,
            age_months: 18,
            asking_price: 12000.0,
            location: "Pune".to_string(),
        }
    }

    #[test]
    fn server_state_with_cancellation_token() {
        let token = CancellationToken::new();
        let (state, _dir) = state(vec![sofa()], token.clone());

        assert!(!state.cancellation_token.is_cancelled());

        token.cancel();
        assert!(state.cancellation_token.is_cancelled());
    }

    #[test]
    fn health_reports_catalog_and_provider() {
        let (state, _dir) = state(vec![sofa()], CancellationToken::new());
        let health = state.health_check();

        assert_eq!(health.catalog_size, 1);
        assert_eq!(&*health.llm_provider, "disabled");
        assert_eq!(health.environment, Environment::Testing);
        assert!(matches!(health.status, HealthStatus::Degraded { .. }));
    }

    #[test]
    fn empty_catalog_degrades_health() {
        let (state, _dir) = state(Vec::new(), CancellationToken::new());
        let health = state.health_check();

        assert_eq!(
            health.status,
            HealthStatus::Degraded {
                reason: Box::from("product catalog is empty")
            }
        );
    }
}

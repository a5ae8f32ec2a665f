// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server implementation module
//!
//! This module provides the main server struct for the marketplace API: wiring
//! the catalog, journal and language model into the agents, router
//! configuration, and coordinated graceful shutdown using `CancellationToken`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use agents::{Catalog, DecisionJournal, FileJournal, MarketplaceAgents};
use axum::{Router, http::HeaderName};
use hyper::Request;
use llm_client::LlmBackend;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, info_span, warn};

use crate::{
    config::ServerConfig,
    error::{ServerError, ServerResult},
    metrics::MeteredModel,
    routes::create_routes,
    state::{ServerModel, ServerState},
};

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
const DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS: u64 = 30;

/// Configuration for server shutdown behavior
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Maximum time in-flight requests get to finish once shutdown starts
    pub graceful_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            graceful_timeout: Duration::from_secs(DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS),
        }
    }
}

/// Main server struct
#[derive(Debug)]
pub struct Server {
    /// Server configuration
    config: ServerConfig,
    /// Application router
    router: Router,
    /// Server state
    state: ServerState,
    /// Cancellation token for coordinated shutdown
    cancellation_token: CancellationToken,
    /// Configuration for coordinated shutdown
    shutdown_config: ShutdownConfig,
}

impl Server {
    /// Create a server from configuration
    ///
    /// Loads the catalog, opens the journal directory and selects the
    /// language model backend.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Dependency` if the catalog cannot be read, the
    /// journal directory cannot be created, or the model client cannot be built.
    pub fn new(config: ServerConfig, shutdown_config: ShutdownConfig) -> ServerResult<Self> {
        let backend = LlmBackend::from_config(&config.llm).map_err(ServerError::dependency)?;
        let catalog = Catalog::from_csv_path(&config.catalog_path)?;
        let journal = FileJournal::open(&config.log_dir)?;

        info!(
            catalog_path = %config.catalog_path.display(),
            catalog_size = catalog.len(),
            log_dir = %config.log_dir.display(),
            llm_enabled = backend.is_enabled(),
            "Server dependencies ready"
        );

        Self::with_dependencies(
            config,
            shutdown_config,
            MeteredModel::new(backend),
            Arc::new(catalog),
            Arc::new(journal),
        )
    }

    /// Create server with explicit collaborators for dependency injection
    ///
    /// # Errors
    ///
    /// Currently infallible; kept fallible to match [`Server::new`].
    pub fn with_dependencies(
        config: ServerConfig,
        shutdown_config: ShutdownConfig,
        model: ServerModel,
        catalog: Arc<Catalog>,
        journal: Arc<dyn DecisionJournal>,
    ) -> ServerResult<Self> {
        let agents = MarketplaceAgents::new(Arc::new(model.clone()), catalog, journal)
            .with_llm_timeout(config.llm_timeout());

        let cancellation_token = CancellationToken::new();
        let state = ServerState::new(
            config.clone(),
            &model,
            Arc::new(agents),
            cancellation_token.child_token(),
        );
        let router = Self::create_router(state.clone());

        Ok(Self {
            config,
            router,
            state,
            cancellation_token,
            shutdown_config,
        })
    }

    /// Create application router with middleware
    fn create_router(state: ServerState) -> Router {
        let timeout_duration = state.config().timeout_seconds.value();

        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
                    let method = req.method();
                    let uri = req.uri();
                    if let Some(request_id) = req.headers().get(REQUEST_ID_HEADER) {
                        info_span!("http_request", ?request_id, %method, %uri)
                    } else {
                        error!("failed to extract id from request");
                        info_span!("http_request", request_id = "unknown", %method, %uri)
                    }
                }),
            )
            .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
            .layer(CorsLayer::permissive())
            .layer(TimeoutLayer::new(timeout_duration));

        create_routes().layer(middleware).with_state(state)
    }

    async fn bind(&self) -> ServerResult<(TcpListener, SocketAddr)> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                address: addr,
                source,
            })?;

        let actual_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Startup { source })?;

        Ok((listener, actual_addr))
    }

    /// Run the server with coordinated graceful shutdown
    ///
    /// Once a shutdown signal arrives, in-flight requests get
    /// [`ShutdownConfig::graceful_timeout`] to finish before the server task
    /// is aborted.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if unable to bind to the configured address,
    /// `ServerError::Startup` if the server fails to start, or
    /// `ServerError::Shutdown` if serving fails.
    pub async fn run(self) -> ServerResult<()> {
        let (listener, actual_addr) = self.bind().await?;

        info!(
            address = %actual_addr,
            environment = %self.config.environment,
            "Marketplace API server starting",
        );

        let shutdown_token = self.cancellation_token.clone();
        tokio::spawn(async move {
            info!("spawning the graceful shutdown task");
            Self::shutdown_signal_handler(shutdown_token).await;
        });

        let serve_token = self.cancellation_token.clone();
        let serve = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                serve_token.cancelled().await;
                info!("Marketplace API server draining connections");
            })
            .into_future();
        let mut handle = tokio::spawn(serve);

        tokio::select! {
            joined = &mut handle => return Self::finish(joined?),
            () = self.cancellation_token.cancelled() => {}
        }

        let graceful_timeout = self.shutdown_config.graceful_timeout;
        if let Ok(joined) = tokio::time::timeout(graceful_timeout, &mut handle).await {
            Self::finish(joined?)
        } else {
            warn!(
                timeout_seconds = graceful_timeout.as_secs(),
                "Graceful shutdown timed out, aborting in-flight requests"
            );
            handle.abort();
            Ok(())
        }
    }

    fn finish(result: std::io::Result<()>) -> ServerResult<()> {
        match result {
            Ok(()) => {
                info!("Marketplace API server shut down gracefully");
                Ok(())
            }
            Err(e) => {
                error!(error = ?e, "Server error during shutdown");
                Err(ServerError::Shutdown { source: e })
            }
        }
    }

    /// Handle shutdown signals and trigger coordinated cancellation
    ///
    /// Listens for SIGINT (Ctrl+C) and SIGTERM and cancels the token when
    /// either arrives.
    async fn shutdown_signal_handler(cancellation_token: CancellationToken) {
        let signal_received = async {
            #[cfg(unix)]
            #[allow(clippy::expect_used)]
            {
                use tokio::signal::unix::{SignalKind, signal};

                let mut sigterm =
                    signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");
                let mut sigint =
                    signal(SignalKind::interrupt()).expect("Failed to register SIGINT handler");

                tokio::select! {
                    _ = sigterm.recv() => "SIGTERM",
                    _ = sigint.recv() => "SIGINT",
                }
            }

            #[cfg(not(unix))]
            #[allow(clippy::expect_used)]
            {
                tokio::signal::ctrl_c()
                    .await
                    .expect("Failed to install CTRL+C signal handler");
                "CTRL+C"
            }
        };

        tokio::select! {
            signal_name = signal_received => {
                warn!(signal = signal_name, "Shutdown signal received, cancelling all operations");
                cancellation_token.cancel();
            },
            () = cancellation_token.cancelled() => {
                info!("Cancellation token already cancelled, shutdown signal handler exiting");
            }
        }
    }

    /// Returns a clone of the cancellation token for coordinated shutdown
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Initiates graceful shutdown by cancelling the server's cancellation token
    pub fn shutdown(&self) {
        info!("programmatic shutdown requested");
        self.cancellation_token.cancel();
    }

    /// Run server for testing, returns the bound address
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if unable to bind to the configured address.
    pub async fn run_for_testing(self) -> ServerResult<(SocketAddr, CancellationToken)> {
        let (listener, actual_addr) = self.bind().await?;

        let token = self.cancellation_token.child_token();
        let task = token.child_token();
        tokio::spawn(async move {
            let _ = axum::serve(listener, self.router)
                .with_graceful_shutdown(async move { task.cancelled().await })
                .await;
        });

        Ok((actual_addr, token))
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get server state for testing
    pub fn state(&self) -> &ServerState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::{NamedTempFile, TempDir};

    use super::*;
    use crate::config::Environment;

    fn catalog_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "id,title,category,brand,condition,age_months,asking_price,location"
        )
        .unwrap();
        writeln!(file, "1,iPhone 12,Mobile,Apple,Good,24,35000,Mumbai").unwrap();
        file
    }

    #[tokio::test]
    async fn server_creation() -> ServerResult<()> {
        let catalog = catalog_file();
        let journal = TempDir::new().unwrap();
        let config = ServerConfig::for_testing()
            .with_catalog_path(catalog.path())
            .with_log_dir(journal.path());

        let server = Server::new(config, ShutdownConfig::default())?;
        assert_eq!(server.config().environment, Environment::Testing);
        assert_eq!(server.state().agents().catalog().len(), 1);
        assert!(!server.cancellation_token().is_cancelled());
        Ok(())
    }

    #[tokio::test]
    async fn missing_catalog_is_a_dependency_error() {
        let journal = TempDir::new().unwrap();
        let config = ServerConfig::for_testing()
            .with_catalog_path(journal.path().join("absent.csv"))
            .with_log_dir(journal.path());

        let err = Server::new(config, ShutdownConfig::default()).unwrap_err();
        assert!(matches!(err, ServerError::Dependency { .. }));
    }

    #[tokio::test]
    async fn programmatic_shutdown() -> ServerResult<()> {
        let catalog = catalog_file();
        let journal = TempDir::new().unwrap();
        let config = ServerConfig::for_testing()
            .with_catalog_path(catalog.path())
            .with_log_dir(journal.path());
        let server = Server::new(config, ShutdownConfig::default())?;

        assert!(!server.cancellation_token().is_cancelled());
        assert!(!server.state().cancellation_token.is_cancelled());

        server.shutdown();

        assert!(server.cancellation_token().is_cancelled());
        assert!(server.state().cancellation_token.is_cancelled());
        Ok(())
    }

    #[tokio::test]
    async fn run_returns_after_shutdown() -> ServerResult<()> {
        let catalog = catalog_file();
        let journal = TempDir::new().unwrap();
        let config = ServerConfig::for_testing()
            .with_catalog_path(catalog.path())
            .with_log_dir(journal.path());
        let server = Server::new(config, ShutdownConfig::default())?;

        let token = server.cancellation_token();
        let running = tokio::spawn(server.run());
        token.cancel();

        running.await??;
        Ok(())
    }

    #[test]
    fn shutdown_config_default() {
        assert_eq!(
            ShutdownConfig::default().graceful_timeout,
            Duration::from_secs(DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS)
        );
    }
}

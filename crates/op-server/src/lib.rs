//! # op-server
//!
//! Axum server for the OpenID provider.
//!
//! The server owns the provider's runtime dependencies: the signing keys
//! (loaded from a PEM file or generated), the backend (file or memory) and
//! the host hooks. The development host signs in a fixed subject; real
//! deployments supply their own [`op_protocol::Host`].
//!
//! ## Usage
//!
//! ```ignore
//! use op_server::{Server, ServerConfig};
//!
//! let config = ServerConfig::from_env()?;
//! let server = Server::new(config).await?;
//! server.run().await?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod router;
pub mod state;

pub use config::ServerConfig;
pub use router::create_router;
pub use state::AppState;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use op_crypto::KeySet;
use op_protocol::{Host, Provider, StaticHost, Subject};
use op_store::{Backend, FileStore, MemoryStore};
use tokio::net::TcpListener;

/// The OpenID provider server.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    provider: Arc<Provider>,
}

impl Server {
    /// Creates a new server instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the key file cannot be read or parsed, or key
    /// generation fails.
    pub async fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let keys = match &config.key_pem {
            Some(path) => {
                let pem = tokio::fs::read_to_string(path).await?;
                tracing::info!(path = %path.display(), "loaded signing key");
                KeySet::from_pem(&pem)?
            }
            None => {
                tracing::info!("generating signing keys");
                KeySet::generate()?
            }
        };

        let backend: Arc<dyn Backend> = match &config.store_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "using file backend");
                Arc::new(FileStore::new(path))
            }
            None => Arc::new(MemoryStore::new()),
        };

        let host: Arc<dyn Host> = match &config.dev_subject {
            Some(subject) => {
                tracing::warn!(subject = %subject, "development host signs every request in");
                Arc::new(StaticHost::new(Subject::new(subject)))
            }
            None => Arc::new(StaticHost::default()),
        };

        let provider = Provider::builder(config.provider_config())
            .with_keys(keys)
            .with_backend(backend)
            .with_host(host)
            .build()?;

        Ok(Self {
            config,
            provider: Arc::new(provider),
        })
    }

    /// Runs the server.
    ///
    /// This starts the HTTP server and blocks until it receives a shutdown signal.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or serving fails.
    pub async fn run(self) -> anyhow::Result<()> {
        let app = self.router();

        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!(issuer = %self.config.issuer, "Server listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Returns the provider.
    #[must_use]
    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Creates the router without starting the server.
    pub fn router(&self) -> Router {
        create_router(AppState::new(self.config.clone(), self.provider.clone()))
    }
}

/// Waits for a shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

//! Application state shared across all request handlers.

use std::sync::Arc;

use op_protocol::Provider;

use crate::config::ServerConfig;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: ServerConfig,

    /// The provider behind every endpoint.
    pub provider: Arc<Provider>,
}

impl AppState {
    /// Creates a new application state.
    #[must_use]
    pub const fn new(config: ServerConfig, provider: Arc<Provider>) -> Self {
        Self { config, provider }
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
}

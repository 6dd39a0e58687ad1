//! The OpenID provider.

use std::fmt;
use std::sync::Arc;

use op_crypto::{JsonWebKeySet, KeySet, OsRandom, SecureRandom};
use op_store::{Backend, BackendExt, MemoryStore, collections};

use crate::client::Client;
use crate::clock::{Clock, SystemClock};
use crate::config::ProviderConfig;
use crate::discovery::ProviderMetadata;
use crate::disposition::{Disposition, finish};
use crate::error::OidcResult;
use crate::handlers::{self, Endpoint};
use crate::host::{Host, StaticHost};
use crate::request::HttpRequest;
use crate::token::IssuerContext;

/// An OpenID provider: configuration, signing keys, storage and the host
/// hooks, plus the endpoint dispatcher.
pub struct Provider {
    config: ProviderConfig,
    keys: KeySet,
    backend: Arc<dyn Backend>,
    host: Arc<dyn Host>,
    clock: Arc<dyn Clock>,
    random: Arc<dyn SecureRandom>,
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("issuer", &self.config.issuer)
            .field("keys", &self.keys)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl Provider {
    /// Starts building a provider.
    #[must_use]
    pub fn builder(config: ProviderConfig) -> ProviderBuilder {
        ProviderBuilder::new(config)
    }

    /// Handles a request to one of the provider's endpoints.
    pub async fn handle(&self, endpoint: Endpoint, request: HttpRequest) -> Disposition {
        tracing::debug!(endpoint = ?endpoint, "handling request");
        finish(handlers::dispatch(self, endpoint, request).await)
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Returns the issuer identifier.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.config.issuer
    }

    /// Returns the signing keys.
    #[must_use]
    pub const fn keys(&self) -> &KeySet {
        &self.keys
    }

    /// Returns the backend.
    #[must_use]
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Returns the host hooks.
    #[must_use]
    pub fn host(&self) -> &dyn Host {
        self.host.as_ref()
    }

    /// Returns the clock.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Returns the random source.
    #[must_use]
    pub fn random(&self) -> &dyn SecureRandom {
        self.random.as_ref()
    }

    /// Returns what token issuance needs from the provider.
    #[must_use]
    pub fn issuer_context(&self) -> IssuerContext<'_> {
        IssuerContext {
            issuer: self.issuer(),
            keys: &self.keys,
            clock: self.clock(),
            random: self.random(),
        }
    }

    /// Returns the discovery document.
    #[must_use]
    pub fn openid_configuration(&self) -> ProviderMetadata {
        ProviderMetadata::from(&self.config)
    }

    /// Returns the public signing keys.
    #[must_use]
    pub fn jwk_set(&self) -> JsonWebKeySet {
        self.keys.jwk_set()
    }

    /// Loads a registered client.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the record is not a client.
    pub async fn get_client(&self, client_id: &str) -> OidcResult<Option<Client>> {
        Ok(self
            .backend
            .get_as::<Client>(collections::CLIENTS, client_id)
            .await?)
    }

    /// Stores a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub async fn put_client(&self, client: &Client) -> OidcResult<()> {
        self.backend
            .put_as(collections::CLIENTS, &client.client_id, client)
            .await?;
        Ok(())
    }

    /// Stores a client unless its identifier is taken. Returns whether the
    /// client was stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub async fn insert_client(&self, client: &Client) -> OidcResult<bool> {
        Ok(self
            .backend
            .insert_as(collections::CLIENTS, &client.client_id, client)
            .await?)
    }
}

/// Builder for [`Provider`].
///
/// Anything not set falls back to: keys generated at build time, an
/// in-memory backend, a [`StaticHost`] that signs nobody in, the system
/// clock and the OS random source.
pub struct ProviderBuilder {
    config: ProviderConfig,
    keys: Option<KeySet>,
    backend: Option<Arc<dyn Backend>>,
    host: Option<Arc<dyn Host>>,
    clock: Option<Arc<dyn Clock>>,
    random: Option<Arc<dyn SecureRandom>>,
}

impl ProviderBuilder {
    /// Creates a builder.
    #[must_use]
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            keys: None,
            backend: None,
            host: None,
            clock: None,
            random: None,
        }
    }

    /// Sets the signing keys.
    #[must_use]
    pub fn with_keys(mut self, keys: KeySet) -> Self {
        self.keys = Some(keys);
        self
    }

    /// Sets the backend.
    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Sets the host hooks.
    #[must_use]
    pub fn with_host(mut self, host: Arc<dyn Host>) -> Self {
        self.host = Some(host);
        self
    }

    /// Sets the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the random source.
    #[must_use]
    pub fn with_random(mut self, random: Arc<dyn SecureRandom>) -> Self {
        self.random = Some(random);
        self
    }

    /// Builds the provider.
    ///
    /// # Errors
    ///
    /// Returns an error if no keys were given and generating them fails.
    pub fn build(self) -> OidcResult<Provider> {
        let keys = match self.keys {
            Some(keys) => keys,
            None => KeySet::generate()?,
        };

        tracing::info!(issuer = %self.config.issuer, "provider ready");

        Ok(Provider {
            config: self.config,
            keys,
            backend: self
                .backend
                .unwrap_or_else(|| Arc::new(MemoryStore::new())),
            host: self
                .host
                .unwrap_or_else(|| Arc::new(StaticHost::default())),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            random: self.random.unwrap_or_else(|| Arc::new(OsRandom)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_provider;

    #[test]
    fn discovery_and_keys() {
        let (provider, _clock) = test_provider();

        let metadata = provider.openid_configuration();
        assert_eq!(metadata.issuer, provider.issuer());
        assert_eq!(metadata.jwks_uri, format!("{}/jwks", provider.issuer()));

        let jwks = provider.jwk_set();
        assert!(!jwks.keys.is_empty());
        assert!(jwks.keys.iter().all(|key| key.kty == "RSA"));
    }

    #[tokio::test]
    async fn client_round_trip() {
        let (provider, _clock) = test_provider();
        let client = Client::new("c1", vec!["https://app.com/cb".to_string()]).with_secret("s");

        provider.put_client(&client).await.unwrap();
        assert_eq!(provider.get_client("c1").await.unwrap(), Some(client));
        assert_eq!(provider.get_client("c2").await.unwrap(), None);
    }
}

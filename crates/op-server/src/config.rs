//! Server configuration.
//!
//! Configuration is loaded from environment variables with sensible defaults.

use std::path::PathBuf;

use op_protocol::ProviderConfig;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host to bind to.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Issuer identifier; endpoint URLs are derived from it.
    pub issuer: String,

    /// Directory for the file backend. Records are kept in memory when unset.
    pub store_path: Option<PathBuf>,

    /// PKCS#8 PEM file with the RSA signing key. A key is generated at
    /// startup when unset.
    pub key_pem: Option<PathBuf>,

    /// Subject the development host signs in. Without one the authorization
    /// endpoint answers 403.
    pub dev_subject: Option<String>,

    /// Authorization code lifespan in seconds.
    pub code_lifespan: i64,

    /// Token lifetime in seconds when neither the request nor the client
    /// sets one.
    pub default_max_age: i64,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let host = std::env::var("OP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_var("OP_PORT")?.unwrap_or(8080);

        let issuer =
            std::env::var("OP_ISSUER").unwrap_or_else(|_| format!("http://{host}:{port}"));

        let store_path = std::env::var("OP_STORE_PATH").ok().map(PathBuf::from);
        let key_pem = std::env::var("OP_KEY_PEM").ok().map(PathBuf::from);
        let dev_subject = std::env::var("OP_DEV_SUBJECT").ok();

        let code_lifespan = parse_var("OP_CODE_LIFESPAN")?.unwrap_or(600);
        let default_max_age = parse_var("OP_DEFAULT_MAX_AGE")?.unwrap_or(3600);

        Ok(Self {
            host,
            port,
            issuer,
            store_path,
            key_pem,
            dev_subject,
            code_lifespan,
            default_max_age,
        })
    }

    /// Configuration for tests: loopback, in-memory, signs in `alice`.
    #[must_use]
    pub fn for_testing(port: u16) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port,
            issuer: format!("http://127.0.0.1:{port}"),
            store_path: None,
            key_pem: None,
            dev_subject: Some("alice".to_string()),
            code_lifespan: 600,
            default_max_age: 3600,
        }
    }

    /// Returns the provider configuration.
    #[must_use]
    pub fn provider_config(&self) -> ProviderConfig {
        let mut config = ProviderConfig::new(&self.issuer);
        config.code_lifespan = self.code_lifespan;
        config.default_max_age = self.default_max_age;
        config
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> anyhow::Result<Option<T>> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{name} must be a number, got {value:?}")),
        Err(_) => Ok(None),
    }
}

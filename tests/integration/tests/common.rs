//! Common test utilities and fixtures.

use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{Client, redirect};
use serde_json::{Value, json};
use tokio::sync::oneshot;
use tokio::time::sleep;

use op_server::{Server, ServerConfig};

/// Redirect URI registered by the test clients.
pub const REDIRECT_URI: &str = "https://example.com/callback";

/// Test environment that manages the server.
pub struct TestEnv {
    /// Base URL of the running server, also the issuer.
    pub base_url: String,
    /// HTTP client that does not follow redirects.
    pub client: Client,
    /// Server shutdown signal.
    _shutdown_tx: oneshot::Sender<()>,
}

/// A client created through dynamic registration.
#[derive(Debug)]
pub struct RegisteredClient {
    /// Client identifier.
    pub client_id: String,
    /// Client secret, absent for implicit-only clients.
    pub client_secret: Option<String>,
    /// Full registration response.
    pub registration: Value,
}

impl TestEnv {
    /// Starts a server with an in-memory store on a free loopback port.
    pub async fn new() -> anyhow::Result<Self> {
        Self::start(None).await
    }

    /// Starts a server that keeps its records under `store_path`.
    pub async fn with_file_store(store_path: &Path) -> anyhow::Result<Self> {
        Self::start(Some(store_path.to_path_buf())).await
    }

    async fn start(store_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Initialize tracing for tests
        let _ = tracing_subscriber::fmt()
            .with_env_filter("op_server=debug,op_protocol=debug")
            .try_init();

        // Find available port for server
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let server_port = listener.local_addr()?.port();
        drop(listener);

        let mut config = ServerConfig::for_testing(server_port);
        config.key_pem = Some(PathBuf::from(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../fixtures/rsa-2048.pem"
        )));
        config.store_path = store_path;
        let base_url = config.issuer.clone();

        let (_shutdown_tx, shutdown_rx) = oneshot::channel();

        let server = Server::new(config).await?;
        tokio::spawn(async move {
            tokio::select! {
                result = server.run() => {
                    if let Err(e) = result {
                        tracing::error!("Server error: {}", e);
                    }
                }
                _ = shutdown_rx => {
                    tracing::info!("Server shutdown requested");
                }
            }
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .redirect(redirect::Policy::none())
            .build()?;

        wait_for_server(&client, &base_url).await?;

        Ok(Self {
            base_url,
            client,
            _shutdown_tx,
        })
    }

    /// Returns the URL of a provider endpoint.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Registers a client with the given extra metadata.
    pub async fn register_client(&self, metadata: Value) -> anyhow::Result<RegisteredClient> {
        let mut body = json!({ "redirect_uris": [REDIRECT_URI] });
        if let (Some(body), Some(extra)) = (body.as_object_mut(), metadata.as_object()) {
            body.extend(extra.clone());
        }

        let response = self
            .client
            .post(self.url("/register"))
            .json(&body)
            .send()
            .await?;
        anyhow::ensure!(
            response.status() == reqwest::StatusCode::CREATED,
            "registration failed with {}",
            response.status()
        );

        let registration: Value = response.json().await?;
        let client_id = registration["client_id"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("registration without client_id"))?
            .to_string();
        let client_secret = registration["client_secret"].as_str().map(String::from);

        Ok(RegisteredClient {
            client_id,
            client_secret,
            registration,
        })
    }

    /// Runs the authorization endpoint and returns the redirect location.
    pub async fn authorize(&self, params: &[(&str, &str)]) -> anyhow::Result<String> {
        let response = self
            .client
            .get(self.url("/authorize"))
            .query(params)
            .send()
            .await?;
        anyhow::ensure!(
            response.status() == reqwest::StatusCode::FOUND,
            "authorization answered {}",
            response.status()
        );

        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .ok_or_else(|| anyhow::anyhow!("redirect without location"))?
            .to_str()?
            .to_string();
        Ok(location)
    }

    /// Obtains an authorization code for a client through the code flow.
    pub async fn authorization_code(&self, client_id: &str) -> anyhow::Result<String> {
        let location = self
            .authorize(&[
                ("client_id", client_id),
                ("redirect_uri", REDIRECT_URI),
                ("response_type", "code"),
                ("scope", "openid"),
                ("state", "s1"),
            ])
            .await?;

        let url = url::Url::parse(&location)?;
        url.query_pairs()
            .find(|(name, _)| name == "code")
            .map(|(_, code)| code.into_owned())
            .ok_or_else(|| anyhow::anyhow!("no code in {location}"))
    }
}

/// Waits for the server to be ready.
async fn wait_for_server(client: &Client, base_url: &str) -> anyhow::Result<()> {
    let health_url = format!("{}/health", base_url);
    let max_attempts = 50;

    for attempt in 1..=max_attempts {
        match client.get(&health_url).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!("Server ready after {} attempts", attempt);
                return Ok(());
            }
            Ok(response) => {
                tracing::debug!(
                    "Server not ready (status {}), attempt {}/{}",
                    response.status(),
                    attempt,
                    max_attempts
                );
            }
            Err(e) => {
                tracing::debug!(
                    "Server not ready ({}), attempt {}/{}",
                    e,
                    attempt,
                    max_attempts
                );
            }
        }
        sleep(Duration::from_millis(100)).await;
    }

    anyhow::bail!("Server did not become ready in time")
}

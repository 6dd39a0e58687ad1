//! Dynamic registration and discovery integration tests.

use serde_json::{Value, json};

use crate::common::{REDIRECT_URI, TestEnv};

/// Tests that registration returns credentials and management metadata.
#[tokio::test]
async fn test_register_client() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let client = env
        .register_client(json!({ "client_name": "Example RP" }))
        .await?;
    let registration = &client.registration;

    assert!(!client.client_id.is_empty(), "Should have client_id");
    assert!(client.client_secret.is_some(), "Should have client_secret");
    assert_eq!(registration["client_secret_expires_at"], 0);
    assert_eq!(registration["client_name"], "Example RP");
    assert_eq!(registration["redirect_uris"], json!([REDIRECT_URI]));
    assert!(registration["client_id_issued_at"].is_i64());
    assert_eq!(
        registration["registration_client_uri"],
        format!("{}/register/{}", env.base_url, client.client_id)
    );

    let token = registration["registration_access_token"]
        .as_str()
        .expect("Should have registration_access_token");
    assert_eq!(token.split('.').count(), 3);

    Ok(())
}

/// Tests that registration without redirect URIs is rejected.
#[tokio::test]
async fn test_register_without_redirect_uris() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env
        .client
        .post(env.url("/register"))
        .json(&json!({ "client_name": "Example RP" }))
        .send()
        .await?;

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "invalid_request");
    assert_eq!(body["error_description"], "Missing redirect_uris parameter");

    Ok(())
}

/// Tests the discovery document and the key set it points to.
#[tokio::test]
async fn test_discovery_and_jwks() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let metadata: Value = env
        .client
        .get(env.url("/.well-known/openid-configuration"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(metadata["issuer"], env.base_url);
    assert_eq!(metadata["registration_endpoint"], env.url("/register"));

    let jwks_uri = metadata["jwks_uri"]
        .as_str()
        .expect("Should have jwks_uri");
    let jwks: Value = env.client.get(jwks_uri).send().await?.json().await?;
    let keys = jwks["keys"].as_array().expect("Should have keys");
    assert!(!keys.is_empty());
    assert!(keys.iter().all(|key| key["kty"] == "RSA" && key.get("d").is_none()));

    Ok(())
}

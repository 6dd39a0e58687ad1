//! Token endpoint integration tests (refresh, client credentials, client
//! authentication).

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};

use crate::auth_flows::{ErrorResponse, TokenResponse};
use crate::common::{REDIRECT_URI, RegisteredClient, TestEnv};

async fn code_grant(env: &TestEnv, client: &RegisteredClient) -> anyhow::Result<TokenResponse> {
    let code = env.authorization_code(&client.client_id).await?;
    let response = env
        .client
        .post(env.url("/token"))
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", REDIRECT_URI),
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.as_deref().unwrap_or_default()),
        ])
        .send()
        .await?;
    anyhow::ensure!(response.status().is_success(), "code grant failed");
    Ok(response.json().await?)
}

/// Tests that a refresh token is rotated on use.
#[tokio::test]
async fn test_refresh_token_rotation() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let client = env.register_client(json!({})).await?;
    let secret = client.client_secret.clone().unwrap_or_default();

    let tokens = code_grant(&env, &client).await?;
    let refresh_token = tokens.refresh_token.expect("Should have refresh token");

    let response = env
        .client
        .post(env.url("/token"))
        .basic_auth(&client.client_id, Some(&secret))
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
        ])
        .send()
        .await?;
    assert!(response.status().is_success(), "Refresh failed");

    let refreshed: TokenResponse = response.json().await?;
    assert_ne!(refreshed.access_token, tokens.access_token);
    let rotated = refreshed.refresh_token.expect("Should have a new refresh token");
    assert_ne!(rotated, refresh_token);
    assert!(refreshed.id_token.is_none());

    let reuse = env
        .client
        .post(env.url("/token"))
        .basic_auth(&client.client_id, Some(&secret))
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
        ])
        .send()
        .await?;
    assert_eq!(reuse.status(), reqwest::StatusCode::BAD_REQUEST);
    let error: ErrorResponse = reuse.json().await?;
    assert_eq!(error.error_description.as_deref(), Some("Invalid refresh token"));

    Ok(())
}

/// Tests that a refresh token only works for the client it was issued to.
#[tokio::test]
async fn test_refresh_token_bound_to_client() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let owner = env.register_client(json!({})).await?;
    let other = env.register_client(json!({})).await?;

    let tokens = code_grant(&env, &owner).await?;
    let refresh_token = tokens.refresh_token.expect("Should have refresh token");

    let response = env
        .client
        .post(env.url("/token"))
        .basic_auth(&other.client_id, other.client_secret.as_ref())
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
        ])
        .send()
        .await?;

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let error: ErrorResponse = response.json().await?;
    assert_eq!(error.error, "invalid_grant");
    assert_eq!(error.error_description.as_deref(), Some("Mismatching client id"));

    Ok(())
}

/// Tests the client credentials grant flow end-to-end.
#[tokio::test]
async fn test_client_credentials_flow() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let client = env.register_client(json!({})).await?;

    let response = env
        .client
        .post(env.url("/token"))
        .basic_auth(&client.client_id, client.client_secret.as_ref())
        .form(&[("grant_type", "client_credentials"), ("scope", "api")])
        .send()
        .await?;
    assert!(response.status().is_success());

    let token: TokenResponse = response.json().await?;
    assert_eq!(token.access_token.split('.').count(), 3);
    assert_eq!(token.expires_in, Some(3600));

    // Client credentials should not return refresh token or ID token
    assert!(token.refresh_token.is_none(), "Should not have refresh token");
    assert!(token.id_token.is_none(), "Should not have ID token");

    Ok(())
}

/// Tests that a client may only use one authentication method.
#[tokio::test]
async fn test_multiple_authentication_methods_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let client = env.register_client(json!({})).await?;
    let secret = client.client_secret.clone().unwrap_or_default();

    let response = env
        .client
        .post(env.url("/token"))
        .basic_auth(&client.client_id, Some(&secret))
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_secret", secret.as_str()),
        ])
        .send()
        .await?;

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let error: ErrorResponse = response.json().await?;
    assert_eq!(error.error, "unauthorized_client");
    assert_eq!(
        error.error_description.as_deref(),
        Some("Must use only one authentication method")
    );

    Ok(())
}

/// Tests that a wrong secret is answered with a Bearer challenge.
#[tokio::test]
async fn test_wrong_client_secret() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let client = env.register_client(json!({})).await?;

    let response = env
        .client
        .post(env.url("/token"))
        .basic_auth(&client.client_id, Some("wrong"))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await?;

    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
    let challenge = response
        .headers()
        .get(reqwest::header::WWW_AUTHENTICATE)
        .expect("Should have a challenge")
        .to_str()?;
    assert!(challenge.starts_with(&format!("Bearer realm=\"{}\"", env.base_url)));

    Ok(())
}

fn client_assertion(secret: &str, claims: &Value) -> anyhow::Result<String> {
    Ok(jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Tests that a client can authenticate with an HMAC-signed assertion.
#[tokio::test]
async fn test_client_secret_jwt_authentication() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let client = env
        .register_client(json!({ "token_endpoint_auth_method": "client_secret_jwt" }))
        .await?;
    let secret = client.client_secret.clone().unwrap_or_default();
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

    let claims = json!({
        "iss": client.client_id,
        "sub": client.client_id,
        "aud": env.url("/token"),
        "jti": "assertion-1",
        "exp": now + 60,
    });
    let response = env
        .client
        .post(env.url("/token"))
        .form(&[
            ("grant_type", "client_credentials"),
            (
                "client_assertion_type",
                "urn:ietf:params:oauth:client-assertion-type:jwt-bearer",
            ),
            ("client_assertion", client_assertion(&secret, &claims)?.as_str()),
        ])
        .send()
        .await?;
    assert!(response.status().is_success(), "Assertion was rejected");
    let token: TokenResponse = response.json().await?;
    assert_eq!(token.access_token.split('.').count(), 3);

    let forged = env
        .client
        .post(env.url("/token"))
        .form(&[
            ("grant_type", "client_credentials"),
            (
                "client_assertion_type",
                "urn:ietf:params:oauth:client-assertion-type:jwt-bearer",
            ),
            ("client_assertion", client_assertion("not-the-secret", &claims)?.as_str()),
        ])
        .send()
        .await?;
    assert_eq!(forged.status(), reqwest::StatusCode::UNAUTHORIZED);

    Ok(())
}

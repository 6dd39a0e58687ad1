//! Authentication flow integration tests.

use serde::Deserialize;
use serde_json::json;

use crate::common::{REDIRECT_URI, TestEnv};

/// Token response from token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: Option<i64>,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
}

/// Error response.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_description: Option<String>,
}

/// Tests that the implicit flow delivers tokens in the fragment.
#[tokio::test]
async fn test_implicit_flow_redirect() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let client = env
        .register_client(json!({ "response_types": ["id_token token"] }))
        .await?;
    assert!(client.client_secret.is_none(), "Implicit clients get no secret");

    let location = env
        .authorize(&[
            ("client_id", client.client_id.as_str()),
            ("redirect_uri", REDIRECT_URI),
            ("response_type", "id_token token"),
            ("scope", "openid"),
            ("nonce", "n-0S6_WzA2Mj"),
            ("state", "af0ifjsldkj"),
        ])
        .await?;

    assert!(
        location.starts_with("https://example.com/callback#access_token="),
        "Unexpected redirect: {location}"
    );
    assert!(location.contains("token_type=Bearer"));
    assert!(location.contains("&id_token="));
    assert!(location.ends_with("&state=af0ifjsldkj"));

    Ok(())
}

/// Tests the authorization code flow end-to-end.
#[tokio::test]
async fn test_authorization_code_flow() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let client = env.register_client(json!({})).await?;
    let secret = client.client_secret.clone().unwrap_or_default();

    let code = env.authorization_code(&client.client_id).await?;

    let response = env
        .client
        .post(env.url("/token"))
        .basic_auth(&client.client_id, Some(&secret))
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", REDIRECT_URI),
        ])
        .send()
        .await?;

    assert!(response.status().is_success(), "Token request failed");
    assert_eq!(
        response.headers()[reqwest::header::CACHE_CONTROL],
        "no-store"
    );

    let token: TokenResponse = response.json().await?;
    assert_eq!(token.access_token.split('.').count(), 3);
    assert_eq!(token.token_type, "Bearer");
    assert_eq!(token.expires_in, Some(3600));
    assert!(token.refresh_token.is_some(), "Should have refresh token");
    let id_token = token.id_token.expect("Should have ID token");
    assert_eq!(id_token.split('.').count(), 3);

    Ok(())
}

/// Tests that an authorization code cannot be redeemed twice.
#[tokio::test]
async fn test_authorization_code_replay() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let client = env.register_client(json!({})).await?;
    let secret = client.client_secret.clone().unwrap_or_default();

    let code = env.authorization_code(&client.client_id).await?;
    let form = [
        ("grant_type", "authorization_code"),
        ("code", code.as_str()),
        ("redirect_uri", REDIRECT_URI),
    ];

    let first = env
        .client
        .post(env.url("/token"))
        .basic_auth(&client.client_id, Some(&secret))
        .form(&form)
        .send()
        .await?;
    assert!(first.status().is_success());

    let second = env
        .client
        .post(env.url("/token"))
        .basic_auth(&client.client_id, Some(&secret))
        .form(&form)
        .send()
        .await?;
    assert_eq!(second.status(), reqwest::StatusCode::BAD_REQUEST);

    let error: ErrorResponse = second.json().await?;
    assert_eq!(error.error, "invalid_grant");
    assert_eq!(
        error.error_description.as_deref(),
        Some("Authorization code invalid")
    );

    Ok(())
}

/// Tests that validation errors after the redirect check go back to the
/// client.
#[tokio::test]
async fn test_authorization_error_redirect() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let client = env.register_client(json!({})).await?;

    let location = env
        .authorize(&[
            ("client_id", client.client_id.as_str()),
            ("redirect_uri", REDIRECT_URI),
            ("response_type", "code"),
            ("state", "s1"),
        ])
        .await?;

    assert_eq!(
        location,
        "https://example.com/callback?error=invalid_scope&error_description=Missing+scope&state=s1"
    );

    Ok(())
}

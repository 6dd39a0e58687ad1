//! RP-initiated logout integration tests.

use serde_json::json;

use crate::auth_flows::TokenResponse;
use crate::common::{REDIRECT_URI, TestEnv};

const POST_LOGOUT_URI: &str = "https://example.com/signed-out";

/// Tests logout with a hint and a registered post-logout redirect URI.
#[tokio::test]
async fn test_logout_redirect() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let client = env
        .register_client(json!({ "post_logout_redirect_uris": [POST_LOGOUT_URI] }))
        .await?;

    let code = env.authorization_code(&client.client_id).await?;
    let tokens: TokenResponse = env
        .client
        .post(env.url("/token"))
        .basic_auth(&client.client_id, client.client_secret.as_ref())
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", REDIRECT_URI),
        ])
        .send()
        .await?
        .json()
        .await?;
    let id_token = tokens.id_token.expect("Should have ID token");

    let response = env
        .client
        .get(env.url("/logout"))
        .query(&[
            ("id_token_hint", id_token.as_str()),
            ("post_logout_redirect_uri", POST_LOGOUT_URI),
            ("state", "bye"),
        ])
        .send()
        .await?;

    assert_eq!(response.status(), reqwest::StatusCode::FOUND);
    assert_eq!(
        response.headers()[reqwest::header::LOCATION],
        "https://example.com/signed-out?state=bye"
    );

    Ok(())
}

/// Tests logout without a redirect.
#[tokio::test]
async fn test_logout_without_redirect() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env.client.get(env.url("/logout")).send().await?;

    assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);
    assert_eq!(response.headers()[reqwest::header::PRAGMA], "no-cache");

    Ok(())
}

/// Tests that a post-logout redirect needs an ID token hint.
#[tokio::test]
async fn test_logout_redirect_requires_hint() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env
        .client
        .get(env.url("/logout"))
        .query(&[("post_logout_redirect_uri", POST_LOGOUT_URI)])
        .send()
        .await?;

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error_description"], "Missing id_token_hint");

    Ok(())
}

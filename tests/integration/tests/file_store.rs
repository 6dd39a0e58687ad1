//! End-to-end flows against the file-backed store.

use serde_json::json;
use tempfile::TempDir;

use crate::auth_flows::{ErrorResponse, TokenResponse};
use crate::common::{REDIRECT_URI, TestEnv};

/// Tests that clients, codes and tokens are written as files and that a
/// code read back from disk can be redeemed exactly once.
#[tokio::test]
async fn test_code_flow_with_file_store() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let env = TestEnv::with_file_store(dir.path()).await?;

    let client = env.register_client(json!({})).await?;
    let secret = client.client_secret.clone().unwrap_or_default();
    assert!(
        dir.path()
            .join("clients")
            .join(format!("{}.json", client.client_id))
            .exists(),
        "Client record should be on disk"
    );

    let code = env.authorization_code(&client.client_id).await?;
    assert!(dir.path().join("codes").join(format!("{code}.json")).exists());

    let form = [
        ("grant_type", "authorization_code"),
        ("code", code.as_str()),
        ("redirect_uri", REDIRECT_URI),
    ];
    let response = env
        .client
        .post(env.url("/token"))
        .basic_auth(&client.client_id, Some(&secret))
        .form(&form)
        .send()
        .await?;
    assert!(response.status().is_success(), "Token request failed");

    let tokens: TokenResponse = response.json().await?;
    let refresh_token = tokens.refresh_token.expect("Should have refresh token");
    assert!(
        dir.path()
            .join("refresh")
            .join(format!("{refresh_token}.json"))
            .exists()
    );
    assert_eq!(std::fs::read_dir(dir.path().join("tokens"))?.count(), 1);

    let replay = env
        .client
        .post(env.url("/token"))
        .basic_auth(&client.client_id, Some(&secret))
        .form(&form)
        .send()
        .await?;
    assert_eq!(replay.status(), reqwest::StatusCode::BAD_REQUEST);
    let error: ErrorResponse = replay.json().await?;
    assert_eq!(
        error.error_description.as_deref(),
        Some("Authorization code invalid")
    );

    Ok(())
}

/// Tests that a refresh token kept on disk is consumed on use.
#[tokio::test]
async fn test_refresh_rotation_with_file_store() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let env = TestEnv::with_file_store(dir.path()).await?;

    let client = env.register_client(json!({})).await?;
    let secret = client.client_secret.clone().unwrap_or_default();
    let code = env.authorization_code(&client.client_id).await?;

    let tokens: TokenResponse = env
        .client
        .post(env.url("/token"))
        .basic_auth(&client.client_id, Some(&secret))
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", REDIRECT_URI),
        ])
        .send()
        .await?
        .json()
        .await?;
    let refresh_token = tokens.refresh_token.expect("Should have refresh token");

    let refresh = || {
        env.client
            .post(env.url("/token"))
            .basic_auth(&client.client_id, Some(&secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
            ])
            .send()
    };

    let first = refresh().await?;
    assert!(first.status().is_success(), "Refresh failed");
    assert!(
        !dir.path()
            .join("refresh")
            .join(format!("{refresh_token}.json"))
            .exists()
    );

    let second = refresh().await?;
    assert_eq!(second.status(), reqwest::StatusCode::BAD_REQUEST);
    let error: ErrorResponse = second.json().await?;
    assert_eq!(error.error, "invalid_grant");
    assert_eq!(error.error_description.as_deref(), Some("Invalid refresh token"));

    Ok(())
}

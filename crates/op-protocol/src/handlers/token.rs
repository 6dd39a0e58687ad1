//! Token endpoint.
//!
//! Chain: validate → authenticate client → redeem code (code grant only) →
//! grant.

use op_store::{BackendExt, collections};

use crate::client::Client;
use crate::client_auth::authenticate_client;
use crate::code::AuthorizationCode;
use crate::disposition::{Disposition, Halt, Step};
use crate::error::OidcError;
use crate::provider::Provider;
use crate::request::{HttpRequest, Params};
use crate::token::{AccessToken, IdToken, Issuance, TokenRecord, TokenResponse};
use crate::types::GrantType;

/// Handles a token request.
///
/// # Errors
///
/// Halts with the error disposition of the first failed check.
pub async fn handle(provider: &Provider, request: HttpRequest) -> Step<Disposition> {
    let params = request.params();
    let grant_type = validate(provider, &params)?;
    let client = authenticate_client(provider, &request, &params).await?;

    match grant_type {
        GrantType::AuthorizationCode => authorization_code_grant(provider, &params, &client).await,
        GrantType::RefreshToken => refresh_token_grant(provider, &params, &client).await,
        GrantType::ClientCredentials => client_credentials_grant(provider, &params, &client).await,
        GrantType::Implicit => Err(OidcError::Internal(format!(
            "grant type {grant_type} reached token dispatch"
        ))
        .into()),
    }
}

/// Checks the grant type and the parameters it needs.
///
/// # Errors
///
/// Halts with 400 `invalid_request` or `unsupported_grant_type`.
pub fn validate(provider: &Provider, params: &Params) -> Step<GrantType> {
    let Some(grant_type) = params.get("grant_type") else {
        return Err(bad_request(OidcError::InvalidRequest("Missing grant type".to_string())));
    };

    let supported = provider.config().supports_grant_type(grant_type);
    let grant_type = match grant_type.parse::<GrantType>() {
        Ok(GrantType::Implicit) | Err(_) => None,
        Ok(grant_type) => Some(grant_type).filter(|_| supported),
    };
    let Some(grant_type) = grant_type else {
        return Err(bad_request(OidcError::UnsupportedGrantType(
            "Unsupported grant type".to_string(),
        )));
    };

    match grant_type {
        GrantType::AuthorizationCode => {
            if !params.contains("code") {
                return Err(bad_request(OidcError::InvalidRequest(
                    "Missing authorization code".to_string(),
                )));
            }
            if !params.contains("redirect_uri") {
                return Err(bad_request(OidcError::InvalidRequest(
                    "Missing redirect uri".to_string(),
                )));
            }
        }
        GrantType::RefreshToken => {
            if !params.contains("refresh_token") {
                return Err(bad_request(OidcError::InvalidRequest(
                    "Missing refresh token".to_string(),
                )));
            }
        }
        GrantType::ClientCredentials | GrantType::Implicit => {}
    }

    Ok(grant_type)
}

async fn authorization_code_grant(
    provider: &Provider,
    params: &Params,
    client: &Client,
) -> Step<Disposition> {
    let code = AuthorizationCode::redeem(
        provider,
        params.get("code").unwrap_or_default(),
        params.get("redirect_uri").unwrap_or_default(),
        &client.client_id,
    )
    .await?;

    let source = Issuance::Code {
        code: &code,
        client,
    };
    let response = AccessToken::issue_for_request(provider, &source, TokenResponse::new()).await?;
    let response = IdToken::issue_for_request(provider, &source, response)?;

    respond(&response)
}

async fn refresh_token_grant(
    provider: &Provider,
    params: &Params,
    client: &Client,
) -> Step<Disposition> {
    let refresh_token = params.get("refresh_token").unwrap_or_default();
    let backend = provider.backend();

    // Taken atomically; a concurrent request with the same token finds nothing.
    let Some(record) = backend
        .take_as::<TokenRecord>(collections::REFRESH, refresh_token)
        .await?
    else {
        return Err(bad_request(OidcError::InvalidGrant(
            "Invalid refresh token".to_string(),
        )));
    };

    if record.payload.aud != client.client_id {
        tracing::warn!(client_id = %client.client_id, "refresh token presented by another client");
        backend
            .insert_as(collections::REFRESH, refresh_token, &record)
            .await?;
        return Err(bad_request(OidcError::InvalidGrant(
            "Mismatching client id".to_string(),
        )));
    }

    let source = Issuance::Refresh {
        claims: &record.payload,
        client,
    };
    let response = AccessToken::issue_for_request(provider, &source, TokenResponse::new()).await?;

    respond(&response)
}

async fn client_credentials_grant(
    provider: &Provider,
    params: &Params,
    client: &Client,
) -> Step<Disposition> {
    let source = Issuance::ClientCredentials {
        client,
        scope: params.get("scope"),
    };
    let response = AccessToken::issue_for_request(provider, &source, TokenResponse::new()).await?;

    respond(&response)
}

fn respond(response: &TokenResponse) -> Step<Disposition> {
    Ok(Disposition::json(200, serde_json::to_value(response)?).no_store())
}

fn bad_request(error: OidcError) -> Halt {
    tracing::debug!(error = %error, "rejected token request");
    Disposition::bad_request(&error).into()
}

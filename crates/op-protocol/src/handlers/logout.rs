//! RP-initiated logout.
//!
//! Chain: verify `id_token_hint` → check post-logout redirect URI →
//! host logout → redirect or 204.

use op_crypto::DecodedJwt;
use op_crypto::jose::{JsonObject, signature_only};
use serde::Serialize;
use serde_json::Value;

use crate::client::Client;
use crate::disposition::{Disposition, Halt, Step, redirect_with};
use crate::error::{OidcError, OidcResult};
use crate::provider::Provider;
use crate::request::{HttpRequest, Params};
use crate::types::ResponseMode;

/// A validated logout request on its way through the host.
#[derive(Debug, Clone)]
pub struct LogoutRequest {
    params: Params,
    id_token_hint: Option<JsonObject>,
    client: Option<Client>,
}

impl LogoutRequest {
    /// Returns the request parameters.
    #[must_use]
    pub const fn params(&self) -> &Params {
        &self.params
    }

    /// Returns the verified claims of the `id_token_hint`.
    #[must_use]
    pub const fn id_token_hint(&self) -> Option<&JsonObject> {
        self.id_token_hint.as_ref()
    }

    /// Returns the client the hint was issued to, when a post-logout
    /// redirect was requested.
    #[must_use]
    pub const fn client(&self) -> Option<&Client> {
        self.client.as_ref()
    }

    /// Returns the subject of the `id_token_hint`.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.id_token_hint
            .as_ref()
            .and_then(|claims| claims.get("sub"))
            .and_then(Value::as_str)
    }

    /// Returns the post-logout redirect URI.
    #[must_use]
    pub fn post_logout_redirect_uri(&self) -> Option<&str> {
        self.params.get("post_logout_redirect_uri")
    }
}

#[derive(Serialize)]
struct LogoutResponse<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a str>,
}

/// Handles a logout request.
///
/// # Errors
///
/// Halts with 400 `invalid_request` when the hint or the redirect URI does
/// not check out.
pub async fn handle(provider: &Provider, request: HttpRequest) -> Step<Disposition> {
    let params = request.params();
    let id_token_hint = validate_id_token_hint(provider, &params)?;
    let client = validate_post_logout_uri(provider, &params, id_token_hint.as_ref()).await?;

    let request = LogoutRequest {
        params,
        id_token_hint,
        client,
    };
    let request = provider.host().logout(request).await?;

    match request.post_logout_redirect_uri() {
        Some(uri) => {
            let response = LogoutResponse {
                state: request.params().get("state"),
            };
            Ok(redirect_with(uri, ResponseMode::Query, &response, None)?)
        }
        None => Ok(Disposition::no_content().no_store()),
    }
}

fn validate_id_token_hint(provider: &Provider, params: &Params) -> Step<Option<JsonObject>> {
    let Some(hint) = params.get("id_token_hint") else {
        return Ok(None);
    };

    match verify_id_token_hint(provider, hint) {
        Ok(claims) => Ok(Some(claims)),
        Err(e) => {
            tracing::debug!(error = %e, "id_token_hint rejected");
            Err(bad_request(OidcError::InvalidRequest(
                "Invalid id_token_hint".to_string(),
            )))
        }
    }
}

/// Verifies a hint against the provider's own keys. Expiry and audience
/// are not enforced.
fn verify_id_token_hint(provider: &Provider, hint: &str) -> OidcResult<JsonObject> {
    let jwt = DecodedJwt::decode(hint)?;
    let key = jwt
        .kid()
        .and_then(|kid| provider.keys().find_by_kid(kid))
        .ok_or_else(|| OidcError::InvalidRequest("unknown signing key".to_string()))?;

    let claims: JsonObject = key.verify(hint, &signature_only(key.algorithm()))?;

    if claims.get("iss").and_then(Value::as_str) != Some(provider.issuer()) {
        return Err(OidcError::InvalidRequest("issuer mismatch".to_string()));
    }

    Ok(claims)
}

async fn validate_post_logout_uri(
    provider: &Provider,
    params: &Params,
    id_token_hint: Option<&JsonObject>,
) -> Step<Option<Client>> {
    let Some(uri) = params.get("post_logout_redirect_uri") else {
        return Ok(None);
    };

    let Some(claims) = id_token_hint else {
        return Err(bad_request(OidcError::InvalidRequest(
            "Missing id_token_hint".to_string(),
        )));
    };

    let client = match audience(claims) {
        Some(client_id) => provider.get_client(client_id).await?,
        None => None,
    };

    match client {
        Some(client) if client.has_post_logout_redirect_uri(uri) => Ok(Some(client)),
        _ => Err(bad_request(OidcError::InvalidRequest(
            "Mismatching post logout redirect uri".to_string(),
        ))),
    }
}

fn audience(claims: &JsonObject) -> Option<&str> {
    match claims.get("aud")? {
        Value::String(aud) => Some(aud),
        Value::Array(auds) => auds.first().and_then(Value::as_str),
        _ => None,
    }
}

fn bad_request(error: OidcError) -> Halt {
    tracing::debug!(error = %error, "rejected logout request");
    Disposition::bad_request(&error).into()
}

//! Client authentication at the token endpoint.
//!
//! The method is chosen by which credentials the request carries:
//! an `Authorization` header (`client_secret_basic`), a `client_secret`
//! parameter (`client_secret_post`) or a `client_assertion_type` parameter
//! (`client_secret_jwt`). Carrying more than one is an error.

use std::borrow::Cow;

use base64::{Engine, engine::general_purpose::STANDARD};
use op_crypto::jose::{JsonObject, verify_with_secret};
use op_crypto::{DecodedJwt, SignatureAlgorithm, constant_time_eq};
use serde_json::Value;

use crate::client::Client;
use crate::disposition::{Disposition, Halt, Step};
use crate::error::OidcError;
use crate::provider::Provider;
use crate::request::{HttpRequest, Params};

/// `client_assertion_type` for JWT client assertions.
pub const JWT_BEARER_ASSERTION_TYPE: &str =
    "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Authenticates the client of a token request.
///
/// # Errors
///
/// Halts with 400 for missing, malformed or conflicting credentials and
/// with 401 for unknown clients and wrong secrets or signatures.
pub async fn authenticate_client(
    provider: &Provider,
    request: &HttpRequest,
    params: &Params,
) -> Step<Client> {
    let basic = request.header("authorization").filter(|h| !h.is_empty());
    let post = params.contains("client_secret");
    let jwt = params.contains("client_assertion_type");

    // Exclusivity is checked before any method looks at its own
    // parameters, so a bad `client_assertion_type` next to a Basic header
    // still reports the conflict.
    if [basic.is_some(), post, jwt].into_iter().filter(|used| *used).count() > 1 {
        return Err(bad_request("Must use only one authentication method"));
    }

    if let Some(authorization) = basic {
        return client_secret_basic(provider, authorization).await;
    }
    if post {
        return client_secret_post(provider, params).await;
    }
    if jwt {
        return client_secret_jwt(provider, params).await;
    }

    Err(bad_request("Missing client credentials"))
}

async fn client_secret_basic(provider: &Provider, authorization: &str) -> Step<Client> {
    let (scheme, encoded) = authorization
        .split_once(' ')
        .unwrap_or((authorization, ""));

    let Some((id, secret)) = decode_basic_credentials(encoded.trim()) else {
        return Err(bad_request("Malformed HTTP Basic credentials"));
    };

    if !scheme.eq_ignore_ascii_case("Basic") {
        return Err(bad_request("Invalid authorization scheme"));
    }

    if id.is_empty() || secret.is_empty() {
        return Err(bad_request("Missing client credentials"));
    }

    verify_secret(provider, &id, &secret).await
}

/// Decodes `base64(id ":" secret)`, with both parts form-urlencoded.
fn decode_basic_credentials(encoded: &str) -> Option<(String, String)> {
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;

    let mut parts = decoded.split(':');
    let (Some(id), Some(secret), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };

    let id = urlencoding::decode(id).ok().map(Cow::into_owned)?;
    let secret = urlencoding::decode(secret).ok().map(Cow::into_owned)?;
    Some((id, secret))
}

async fn client_secret_post(provider: &Provider, params: &Params) -> Step<Client> {
    let (Some(id), Some(secret)) = (params.get("client_id"), params.get("client_secret")) else {
        return Err(bad_request("Missing client credentials"));
    };

    verify_secret(provider, id, secret).await
}

async fn verify_secret(provider: &Provider, id: &str, secret: &str) -> Step<Client> {
    let Some(client) = provider.get_client(id).await? else {
        return Err(unauthorized(provider, "Unknown client identifier"));
    };

    let matches = client
        .client_secret
        .as_deref()
        .is_some_and(|expected| constant_time_eq(expected.as_bytes(), secret.as_bytes()));

    if !matches {
        tracing::debug!(client_id = %id, "client secret mismatch");
        return Err(unauthorized(provider, "Mismatching client secret"));
    }

    Ok(client)
}

async fn client_secret_jwt(provider: &Provider, params: &Params) -> Step<Client> {
    if params.get("client_assertion_type") != Some(JWT_BEARER_ASSERTION_TYPE) {
        return Err(bad_request("Invalid client assertion type"));
    }

    let Some(assertion) = params.get("client_assertion") else {
        return Err(bad_request("Missing client assertion"));
    };

    let candidate = DecodedJwt::decode(assertion)
        .ok()
        .and_then(|jwt| jwt.claim_str("sub").map(str::to_string));
    let Some(client_id) = candidate else {
        return Err(bad_request("Cannot extract client id from JWT"));
    };

    let Some(client) = provider.get_client(&client_id).await? else {
        return Err(unauthorized(provider, "Unknown client"));
    };

    let Some(secret) = client.client_secret.as_deref() else {
        return Err(bad_request("Missing client secret"));
    };

    let claims = match verify_assertion(assertion, secret) {
        Some(claims) => claims,
        None => {
            tracing::debug!(client_id = %client_id, "client assertion signature rejected");
            return Err(unauthorized(provider, "Invalid client JWT"));
        }
    };

    if !assertion_claims_valid(provider, &client, &claims) {
        tracing::debug!(client_id = %client_id, "client assertion claims rejected");
        return Err(unauthorized(provider, "Invalid client JWT"));
    }

    Ok(client)
}

/// Verifies the HMAC signature; claims are untrusted until this passes.
fn verify_assertion(assertion: &str, secret: &str) -> Option<JsonObject> {
    let jwt = DecodedJwt::decode(assertion).ok()?;
    let alg: SignatureAlgorithm = jwt.alg()?.parse().ok()?;
    if !alg.is_hmac() {
        return None;
    }
    verify_with_secret(assertion, alg, secret.as_bytes()).ok()
}

fn assertion_claims_valid(provider: &Provider, client: &Client, claims: &JsonObject) -> bool {
    let claim = |name: &str| claims.get(name).and_then(Value::as_str);
    let client_id = client.client_id.as_str();

    let parties_match = claim("iss") == Some(client_id) && claim("sub") == Some(client_id);

    let token_endpoint = provider.config().token_endpoint();
    let audience_ok = match claims.get("aud") {
        Some(Value::String(aud)) => aud == &token_endpoint || aud == provider.issuer(),
        Some(Value::Array(auds)) => auds.iter().filter_map(Value::as_str).any(|aud| {
            aud == token_endpoint || aud == provider.issuer()
        }),
        _ => false,
    };

    let unexpired = claims
        .get("exp")
        .and_then(Value::as_i64)
        .is_some_and(|exp| exp > provider.clock().now());

    parties_match && audience_ok && unexpired
}

fn bad_request(description: &str) -> Halt {
    Disposition::bad_request(&OidcError::UnauthorizedClient(description.to_string())).into()
}

fn unauthorized(provider: &Provider, description: &str) -> Halt {
    Disposition::unauthorized(
        provider.issuer(),
        &OidcError::UnauthorizedClient(description.to_string()),
    )
    .into()
}

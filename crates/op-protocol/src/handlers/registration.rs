//! Dynamic client registration.
//!
//! Chain: validate → register → registration access token → 201.

use op_crypto::random::{generate_client_id, generate_client_secret};
use op_crypto::{KeyPurpose, SignatureAlgorithm};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::Client;
use crate::disposition::{Disposition, Halt, Step};
use crate::error::{OidcError, OidcResult};
use crate::provider::Provider;
use crate::request::HttpRequest;

/// Claims of a registration access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationClaims {
    /// Issuer.
    pub iss: String,
    /// The registered client.
    pub aud: String,
    /// The registered client.
    pub sub: String,
}

/// Handles a registration request.
///
/// # Errors
///
/// Halts with 400 `invalid_request` when the metadata is missing or
/// invalid.
pub async fn handle(provider: &Provider, request: HttpRequest) -> Step<Disposition> {
    let client = validate(provider, request.json).await?;
    if !provider.insert_client(&client).await? {
        return Err(already_registered());
    }
    tracing::info!(client_id = %client.client_id, "registered client");

    let token = registration_access_token(provider, &client)?;
    respond(provider, &client, token)
}

/// Builds the client from the registration metadata, generating its
/// identifier and secret.
///
/// # Errors
///
/// Halts with 400 `invalid_request` on missing or invalid metadata.
pub async fn validate(provider: &Provider, body: Option<Value>) -> Step<Client> {
    let Some(Value::Object(mut metadata)) = body else {
        return Err(bad_request(OidcError::InvalidRequest(
            "Missing registration request body".to_string(),
        )));
    };

    if metadata.get("redirect_uris").is_none_or(Value::is_null) {
        return Err(bad_request(OidcError::InvalidRequest(
            "Missing redirect_uris parameter".to_string(),
        )));
    }

    let has_client_id = metadata
        .get("client_id")
        .and_then(Value::as_str)
        .is_some_and(|id| !id.is_empty());
    if !has_client_id {
        metadata.insert(
            "client_id".to_string(),
            Value::String(generate_client_id(provider.random())),
        );
    }

    let mut client = Client::from_metadata(Value::Object(metadata)).map_err(bad_request)?;

    if provider.get_client(&client.client_id).await?.is_some() {
        return Err(already_registered());
    }

    client.client_secret = if client.is_implicit_only() {
        None
    } else {
        Some(generate_client_secret(provider.random()))
    };

    Ok(client)
}

/// Signs the token the client uses to manage its registration.
///
/// # Errors
///
/// Returns an error if the registration key is missing or signing fails.
pub fn registration_access_token(provider: &Provider, client: &Client) -> OidcResult<String> {
    let key = provider
        .issuer_context()
        .signing_key(KeyPurpose::Register, SignatureAlgorithm::Rs256)?;

    let claims = RegistrationClaims {
        iss: provider.issuer().to_string(),
        aud: client.client_id.clone(),
        sub: client.client_id.clone(),
    };

    Ok(key.sign(&key.header(), &claims)?)
}

fn respond(provider: &Provider, client: &Client, token: String) -> Step<Disposition> {
    let mut body = serde_json::to_value(client)?;

    if let Value::Object(fields) = &mut body {
        fields.insert("registration_access_token".to_string(), token.into());
        fields.insert(
            "registration_client_uri".to_string(),
            provider
                .config()
                .endpoint(&format!("/register/{}", client.client_id))
                .into(),
        );
        fields.insert(
            "client_id_issued_at".to_string(),
            provider.clock().now().into(),
        );
        if client.client_secret.is_some() {
            fields.insert("client_secret_expires_at".to_string(), 0.into());
        }
    }

    Ok(Disposition::json(201, body).no_store())
}

fn already_registered() -> Halt {
    bad_request(OidcError::InvalidRequest(
        "Client validation error: client_id already registered".to_string(),
    ))
}

fn bad_request(error: OidcError) -> Halt {
    tracing::debug!(error = %error, "rejected registration request");
    Disposition::bad_request(&error).into()
}

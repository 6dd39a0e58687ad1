//! Authorization codes.

use op_crypto::random::generate_auth_code;
use op_store::{BackendExt, collections};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::disposition::{Disposition, Halt, Step};
use crate::error::{OidcError, OidcResult};
use crate::handlers::authentication::AuthenticationRequest;
use crate::provider::Provider;
use crate::token::client_max_age;

/// A single-use authorization code, stored under `codes/<code>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationCode {
    /// The code value.
    pub code: String,
    /// Subject.
    pub sub: String,
    /// Client the code was issued to.
    pub aud: String,
    /// Expiration time.
    pub exp: i64,
    /// Lifetime of tokens issued for this code.
    pub max: i64,
    /// Granted scope.
    pub scope: String,
    /// Nonce from the authentication request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Redirect URI the code was delivered to.
    pub redirect_uri: String,
    /// Set once the code has been exchanged.
    #[serde(default)]
    pub used: bool,
    /// Proof-of-possession key from the request object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cnf: Option<Value>,
}

impl AuthorizationCode {
    /// Builds the code record for an authenticated request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request has no subject.
    pub fn new(provider: &Provider, request: &AuthenticationRequest) -> OidcResult<Self> {
        let subject = request
            .subject()
            .ok_or_else(|| OidcError::Internal("authentication request has no subject".to_string()))?;
        let params = request.params();
        let config = provider.config();

        Ok(Self {
            code: generate_auth_code(provider.random()),
            sub: subject.id.clone(),
            aud: request.client().client_id.clone(),
            exp: provider.clock().now() + config.code_lifespan,
            max: request
                .max_age()
                .unwrap_or_else(|| client_max_age(request.client(), config)),
            scope: params.get("scope").unwrap_or_default().to_string(),
            nonce: params.get("nonce").map(str::to_string),
            redirect_uri: params.get("redirect_uri").unwrap_or_default().to_string(),
            used: false,
            cnf: request.cnf().cloned(),
        })
    }

    /// Issues and stores a code for an authenticated request.
    ///
    /// # Errors
    ///
    /// Fails if the request has no subject or the backend write fails.
    pub async fn issue(provider: &Provider, request: &AuthenticationRequest) -> OidcResult<Self> {
        let code = Self::new(provider, request)?;
        provider
            .backend()
            .put_as(collections::CODES, &code.code, &code)
            .await?;

        tracing::info!(aud = %code.aud, sub = %code.sub, "issued authorization code");
        Ok(code)
    }

    /// Returns whether the code expired before `now`.
    #[must_use]
    pub const fn is_expired(&self, now: i64) -> bool {
        self.exp < now
    }

    /// Redeems a code for `client_id` at `redirect_uri`, marking it used.
    ///
    /// Checks run in order and all fail with `invalid_grant`: the code must
    /// exist, be unused, be unexpired, and match the redirect URI and
    /// client it was issued for. The used flag is set with an atomic swap,
    /// so of two concurrent redemptions only one succeeds.
    ///
    /// # Errors
    ///
    /// Halts with a 400 on any failed check; fails on backend errors.
    pub async fn redeem(
        provider: &Provider,
        code: &str,
        redirect_uri: &str,
        client_id: &str,
    ) -> Step<Self> {
        let backend = provider.backend();
        let Some(record) = backend
            .get_as::<Self>(collections::CODES, code)
            .await?
        else {
            return Err(invalid_grant("Authorization not found"));
        };

        if record.used {
            tracing::warn!(aud = %record.aud, "authorization code replayed");
            return Err(invalid_grant("Authorization code invalid"));
        }

        if record.is_expired(provider.clock().now()) {
            return Err(invalid_grant("Authorization code expired"));
        }

        if record.redirect_uri != redirect_uri {
            return Err(invalid_grant("Mismatching redirect uri"));
        }

        if record.aud != client_id {
            return Err(invalid_grant("Mismatching client id"));
        }

        let redeemed = Self {
            used: true,
            ..record
        };
        let previous = backend
            .swap(collections::CODES, code, serde_json::to_value(&redeemed)?)
            .await?;

        let raced = previous
            .as_ref()
            .and_then(|value| value.get("used"))
            .and_then(Value::as_bool)
            .unwrap_or(true);
        if raced {
            tracing::warn!(aud = %redeemed.aud, "authorization code redeemed concurrently");
            return Err(invalid_grant("Authorization code invalid"));
        }

        Ok(redeemed)
    }
}

fn invalid_grant(description: &str) -> Halt {
    Disposition::bad_request(&OidcError::InvalidGrant(description.to_string())).into()
}

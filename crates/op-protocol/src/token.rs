//! Token issuance.
//!
//! [`AccessToken::issue`] and [`IdToken::issue`] build and sign a single
//! token from explicit options. The `issue_for_request` functions derive
//! those options from whatever is being exchanged (an authentication
//! request, a redeemed code, a refresh token or a client credentials
//! grant) and add the result to a [`TokenResponse`].

use std::sync::Arc;

use jsonwebtoken::Header;
use op_crypto::algorithm::hash_length;
use op_crypto::random::{generate_refresh_token, generate_token_id};
use op_crypto::{KeyPurpose, KeySet, SecureRandom, SignatureAlgorithm, SigningKey, hash_claim};
use op_store::{BackendExt, collections};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::Client;
use crate::clock::Clock;
use crate::code::AuthorizationCode;
use crate::config::ProviderConfig;
use crate::disposition::Step;
use crate::error::{OidcError, OidcResult};
use crate::handlers::authentication::AuthenticationRequest;
use crate::provider::Provider;

/// Token lifetime when nothing else sets one.
pub const DEFAULT_MAX_AGE: i64 = 3600;

/// Longest lifetime a request or client registration can ask for (one
/// year). Larger values are clamped.
pub const MAX_LIFETIME: i64 = 31_536_000;

fn expiry(iat: i64, max: i64) -> OidcResult<i64> {
    iat.checked_add(max)
        .ok_or_else(|| OidcError::Internal(format!("token lifetime {max} overflows")))
}

/// Everything needed to sign a token.
#[derive(Debug, Clone, Copy)]
pub struct IssuerContext<'a> {
    /// Issuer identifier (`iss`).
    pub issuer: &'a str,
    /// Provider signing keys.
    pub keys: &'a KeySet,
    /// Time source for `iat`.
    pub clock: &'a dyn Clock,
    /// Randomness for `jti`.
    pub random: &'a dyn SecureRandom,
}

impl<'a> IssuerContext<'a> {
    /// Resolves the signing key for a purpose and algorithm. The key
    /// borrows from the key set, not from the context.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::KeyResolution`] if no key is provisioned.
    pub fn signing_key(
        &self,
        purpose: KeyPurpose,
        algorithm: SignatureAlgorithm,
    ) -> OidcResult<&'a Arc<SigningKey>> {
        self.keys
            .signing_key(purpose, algorithm)
            .ok_or(OidcError::KeyResolution { purpose, algorithm })
    }
}

/// Access token claim set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Issuer.
    pub iss: String,
    /// Client the token was issued to.
    pub aud: String,
    /// Subject.
    pub sub: String,
    /// Expiration time.
    pub exp: i64,
    /// Issued at.
    pub iat: i64,
    /// Token ID.
    pub jti: String,
    /// Granted scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Proof-of-possession key confirmation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cnf: Option<Value>,
}

/// ID token claim set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Issuer.
    pub iss: String,
    /// Client the token was issued to.
    pub aud: String,
    /// Subject.
    pub sub: String,
    /// Expiration time.
    pub exp: i64,
    /// Issued at.
    pub iat: i64,
    /// Token ID.
    pub jti: String,
    /// Nonce from the authentication request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Authorized party.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,
    /// Access token hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_hash: Option<String>,
    /// Authorization code hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c_hash: Option<String>,
    /// Proof-of-possession key confirmation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cnf: Option<Value>,
}

/// Persisted form of an access token, stored under `tokens/<jti>` and
/// `refresh/<refresh token>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// JOSE header.
    pub header: Header,
    /// Claims.
    pub payload: AccessTokenClaims,
}

/// Options for [`AccessToken::issue`].
#[derive(Debug, Clone, Default)]
pub struct AccessTokenOptions {
    aud: String,
    sub: String,
    alg: Option<SignatureAlgorithm>,
    jti: Option<String>,
    iat: Option<i64>,
    max: Option<i64>,
    scope: Option<String>,
    cnf: Option<Value>,
}

impl AccessTokenOptions {
    /// Creates options for a token issued to `aud` about `sub`.
    #[must_use]
    pub fn new(aud: impl Into<String>, sub: impl Into<String>) -> Self {
        Self {
            aud: aud.into(),
            sub: sub.into(),
            ..Self::default()
        }
    }

    /// Sets the signing algorithm (default RS256).
    #[must_use]
    pub const fn with_alg(mut self, alg: SignatureAlgorithm) -> Self {
        self.alg = Some(alg);
        self
    }

    /// Sets the token ID.
    #[must_use]
    pub fn with_jti(mut self, jti: impl Into<String>) -> Self {
        self.jti = Some(jti.into());
        self
    }

    /// Sets the issue time.
    #[must_use]
    pub const fn with_iat(mut self, iat: i64) -> Self {
        self.iat = Some(iat);
        self
    }

    /// Sets the lifetime in seconds.
    #[must_use]
    pub const fn with_max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }

    /// Sets the granted scope.
    #[must_use]
    pub fn with_scope(mut self, scope: Option<String>) -> Self {
        self.scope = scope;
        self
    }

    /// Binds the token to a key.
    #[must_use]
    pub fn with_cnf(mut self, cnf: Option<Value>) -> Self {
        self.cnf = cnf;
        self
    }
}

/// A signed-to-be access token.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// JOSE header.
    pub header: Header,
    /// Claims.
    pub payload: AccessTokenClaims,
    key: Arc<SigningKey>,
}

impl AccessToken {
    /// Builds an access token.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::KeyResolution`] if there is no `token` key for
    /// the algorithm.
    pub fn issue(ctx: &IssuerContext<'_>, options: AccessTokenOptions) -> OidcResult<Self> {
        let alg = options.alg.unwrap_or(SignatureAlgorithm::Rs256);
        let key = ctx.signing_key(KeyPurpose::Token, alg)?;
        let iat = options.iat.unwrap_or_else(|| ctx.clock.now());
        let max = options.max.unwrap_or(DEFAULT_MAX_AGE);

        let payload = AccessTokenClaims {
            iss: ctx.issuer.to_string(),
            aud: options.aud,
            sub: options.sub,
            exp: expiry(iat, max)?,
            iat,
            jti: options.jti.unwrap_or_else(|| generate_token_id(ctx.random)),
            scope: options.scope,
            cnf: options.cnf,
        };

        Ok(Self {
            header: key.header(),
            payload,
            key: Arc::clone(key),
        })
    }

    /// Signs the token into its compact form.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn encode(&self) -> OidcResult<String> {
        Ok(self.key.sign(&self.header, &self.payload)?)
    }

    /// Returns the persisted form.
    #[must_use]
    pub fn record(&self) -> TokenRecord {
        TokenRecord {
            header: self.header.clone(),
            payload: self.payload.clone(),
        }
    }

    /// Issues an access token for an exchange, persists it and adds it to
    /// the response. A refresh token is added when the exchange involves an
    /// authorization code.
    ///
    /// # Errors
    ///
    /// Fails on key resolution, signing or storage errors.
    pub async fn issue_for_request(
        provider: &Provider,
        source: &Issuance<'_>,
        response: TokenResponse,
    ) -> Step<TokenResponse> {
        let grant = source.grant(provider.config())?;
        let options = AccessTokenOptions::new(grant.aud, grant.sub)
            .with_alg(source.client().access_token_alg())
            .with_max(grant.max)
            .with_scope(grant.scope)
            .with_cnf(grant.cnf);

        let token = Self::issue(&provider.issuer_context(), options)?;
        let compact = token.encode()?;
        let record = token.record();

        let backend = provider.backend();
        backend
            .put_as(collections::TOKENS, &record.payload.jti, &record)
            .await?;

        let mut response = response.with_access_token(compact, grant.max);

        if grant.refresh {
            let refresh = generate_refresh_token(provider.random());
            backend
                .put_as(collections::REFRESH, &refresh, &record)
                .await?;
            response = response.with_refresh_token(refresh);
        }

        tracing::debug!(jti = %record.payload.jti, aud = %record.payload.aud, "issued access token");
        Ok(response)
    }
}

/// Options for [`IdToken::issue`].
#[derive(Debug, Clone, Default)]
pub struct IdTokenOptions {
    aud: String,
    sub: String,
    nonce: Option<String>,
    alg: Option<SignatureAlgorithm>,
    jti: Option<String>,
    iat: Option<i64>,
    max: Option<i64>,
    azp: Option<String>,
    at_hash: Option<String>,
    c_hash: Option<String>,
    cnf: Option<Value>,
}

impl IdTokenOptions {
    /// Creates options for an ID token issued to `aud` about `sub`, echoing
    /// the request's `nonce`.
    #[must_use]
    pub fn new(aud: impl Into<String>, sub: impl Into<String>, nonce: Option<String>) -> Self {
        Self {
            aud: aud.into(),
            sub: sub.into(),
            nonce,
            ..Self::default()
        }
    }

    /// Sets the signing algorithm (default RS256).
    #[must_use]
    pub const fn with_alg(mut self, alg: SignatureAlgorithm) -> Self {
        self.alg = Some(alg);
        self
    }

    /// Sets the token ID.
    #[must_use]
    pub fn with_jti(mut self, jti: impl Into<String>) -> Self {
        self.jti = Some(jti.into());
        self
    }

    /// Sets the issue time.
    #[must_use]
    pub const fn with_iat(mut self, iat: i64) -> Self {
        self.iat = Some(iat);
        self
    }

    /// Sets the lifetime in seconds.
    #[must_use]
    pub const fn with_max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }

    /// Sets the authorized party (defaults to `aud`).
    #[must_use]
    pub fn with_azp(mut self, azp: impl Into<String>) -> Self {
        self.azp = Some(azp.into());
        self
    }

    /// Sets the access token hash.
    #[must_use]
    pub fn with_at_hash(mut self, at_hash: Option<String>) -> Self {
        self.at_hash = at_hash;
        self
    }

    /// Sets the authorization code hash.
    #[must_use]
    pub fn with_c_hash(mut self, c_hash: Option<String>) -> Self {
        self.c_hash = c_hash;
        self
    }

    /// Binds the token to a key.
    #[must_use]
    pub fn with_cnf(mut self, cnf: Option<Value>) -> Self {
        self.cnf = cnf;
        self
    }
}

/// A signed-to-be ID token.
#[derive(Debug, Clone)]
pub struct IdToken {
    /// JOSE header.
    pub header: Header,
    /// Claims.
    pub payload: IdTokenClaims,
    key: Arc<SigningKey>,
}

impl IdToken {
    /// Builds an ID token.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::KeyResolution`] if there is no `id_token` key
    /// for the algorithm.
    pub fn issue(ctx: &IssuerContext<'_>, options: IdTokenOptions) -> OidcResult<Self> {
        let alg = options.alg.unwrap_or(SignatureAlgorithm::Rs256);
        let key = ctx.signing_key(KeyPurpose::IdToken, alg)?;
        let iat = options.iat.unwrap_or_else(|| ctx.clock.now());
        let max = options.max.unwrap_or(DEFAULT_MAX_AGE);
        let azp = options.azp.unwrap_or_else(|| options.aud.clone());

        let payload = IdTokenClaims {
            iss: ctx.issuer.to_string(),
            aud: options.aud,
            sub: options.sub,
            exp: expiry(iat, max)?,
            iat,
            jti: options.jti.unwrap_or_else(|| generate_token_id(ctx.random)),
            nonce: options.nonce,
            azp: Some(azp),
            at_hash: options.at_hash,
            c_hash: options.c_hash,
            cnf: options.cnf,
        };

        Ok(Self {
            header: key.header(),
            payload,
            key: Arc::clone(key),
        })
    }

    /// Signs the token into its compact form.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn encode(&self) -> OidcResult<String> {
        Ok(self.key.sign(&self.header, &self.payload)?)
    }

    /// Issues an ID token for an exchange and adds it to the response,
    /// hashing whatever access token and code the response already holds.
    ///
    /// # Errors
    ///
    /// Fails on key resolution or signing errors.
    pub fn issue_for_request(
        provider: &Provider,
        source: &Issuance<'_>,
        response: TokenResponse,
    ) -> Step<TokenResponse> {
        let grant = source.grant(provider.config())?;
        let alg = source.client().id_token_signed_response_alg;
        let bits = hash_length(alg.jwa_name()).ok_or_else(|| {
            OidcError::Internal(format!("{alg} has no hash length"))
        })?;

        let at_hash = response
            .access_token
            .as_deref()
            .and_then(|token| hash_claim(token, bits));
        let c_hash = response
            .code
            .as_deref()
            .and_then(|code| hash_claim(code, bits));

        let options = IdTokenOptions::new(grant.aud, grant.sub, grant.nonce)
            .with_alg(alg)
            .with_max(grant.max)
            .with_at_hash(at_hash)
            .with_c_hash(c_hash)
            .with_cnf(grant.cnf);

        let token = Self::issue(&provider.issuer_context(), options)?;
        Ok(response.with_id_token(token.encode()?))
    }
}

/// What a token is being issued in exchange for.
#[derive(Debug, Clone, Copy)]
pub enum Issuance<'a> {
    /// A validated, authenticated and consented authentication request.
    Authentication(&'a AuthenticationRequest),

    /// A redeemed authorization code.
    Code {
        /// The code record.
        code: &'a AuthorizationCode,
        /// The authenticated client.
        client: &'a Client,
    },

    /// A refresh token, with the claims of the access token it was
    /// issued alongside.
    Refresh {
        /// Stored access token claims.
        claims: &'a AccessTokenClaims,
        /// The authenticated client.
        client: &'a Client,
    },

    /// A client credentials grant.
    ClientCredentials {
        /// The authenticated client.
        client: &'a Client,
        /// Requested scope.
        scope: Option<&'a str>,
    },
}

/// Claims derived from an [`Issuance`].
#[derive(Debug, Clone)]
struct Grant {
    aud: String,
    sub: String,
    scope: Option<String>,
    nonce: Option<String>,
    max: i64,
    cnf: Option<Value>,
    refresh: bool,
}

impl Issuance<'_> {
    /// Returns the client tokens are issued to.
    #[must_use]
    pub fn client(&self) -> &Client {
        match self {
            Self::Authentication(request) => request.client(),
            Self::Code { client, .. }
            | Self::Refresh { client, .. }
            | Self::ClientCredentials { client, .. } => client,
        }
    }

    fn grant(&self, config: &ProviderConfig) -> OidcResult<Grant> {
        let client_max = || client_max_age(self.client(), config);

        let grant = match self {
            Self::Authentication(request) => {
                let subject = request.subject().ok_or_else(|| {
                    OidcError::Internal("authentication request has no subject".to_string())
                })?;
                let params = request.params();

                Grant {
                    aud: request.client().client_id.clone(),
                    sub: subject.id.clone(),
                    scope: params.get("scope").map(str::to_string),
                    nonce: params.get("nonce").map(str::to_string),
                    max: request.max_age().unwrap_or_else(client_max),
                    cnf: request.cnf().cloned(),
                    refresh: request.includes_response_type("code"),
                }
            }
            Self::Code { code, .. } => Grant {
                aud: code.aud.clone(),
                sub: code.sub.clone(),
                scope: Some(code.scope.clone()),
                nonce: code.nonce.clone(),
                max: Some(code.max)
                    .filter(|max| *max > 0 && *max <= MAX_LIFETIME)
                    .unwrap_or_else(client_max),
                cnf: code.cnf.clone(),
                refresh: true,
            },
            Self::Refresh { claims, .. } => Grant {
                aud: claims.aud.clone(),
                sub: claims.sub.clone(),
                scope: claims.scope.clone(),
                nonce: None,
                max: claims
                    .exp
                    .checked_sub(claims.iat)
                    .filter(|max| *max > 0 && *max <= MAX_LIFETIME)
                    .unwrap_or_else(client_max),
                cnf: claims.cnf.clone(),
                refresh: true,
            },
            Self::ClientCredentials { client, scope } => Grant {
                aud: client.client_id.clone(),
                sub: client.client_id.clone(),
                scope: scope.map(str::to_string),
                nonce: None,
                max: client_max(),
                cnf: None,
                refresh: false,
            },
        };

        Ok(grant)
    }
}

/// Lifetime from the client's `default_max_age`, else the provider default,
/// capped at [`MAX_LIFETIME`].
#[must_use]
pub fn client_max_age(client: &Client, config: &ProviderConfig) -> i64 {
    client
        .default_max_age
        .filter(|max| *max > 0)
        .unwrap_or(config.default_max_age)
        .min(MAX_LIFETIME)
}

/// Authorization or token endpoint response parameters.
///
/// Each step consumes the response and returns an extended copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Token type, `Bearer` whenever an access token is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// Access token lifetime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,

    /// Refresh token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Authorization code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// ID token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

impl TokenResponse {
    /// Creates an empty response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an access token.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>, expires_in: i64) -> Self {
        self.access_token = Some(token.into());
        self.token_type = Some("Bearer".to_string());
        self.expires_in = Some(expires_in);
        self
    }

    /// Adds a refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    /// Adds an authorization code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Adds an ID token.
    #[must_use]
    pub fn with_id_token(mut self, token: impl Into<String>) -> Self {
        self.id_token = Some(token.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use op_crypto::jose::signature_only;
    use op_crypto::{OsRandom, SeededRandom};

    use crate::clock::FixedClock;

    const TEST_KEY: &str = include_str!("../../../tests/fixtures/rsa-2048.pem");
    const NOW: i64 = 1_700_000_000;

    fn keys() -> KeySet {
        KeySet::from_pem(TEST_KEY).unwrap()
    }

    #[test]
    fn access_token_lifetime() {
        let keys = keys();
        let clock = FixedClock::new(NOW);
        let ctx = IssuerContext {
            issuer: "https://op.test",
            keys: &keys,
            clock: &clock,
            random: &OsRandom,
        };

        let token = AccessToken::issue(&ctx, AccessTokenOptions::new("client", "alice")).unwrap();
        assert_eq!(token.payload.iat, NOW);
        assert_eq!(token.payload.exp - token.payload.iat, DEFAULT_MAX_AGE);
        assert_eq!(token.payload.jti.len(), 16);
        assert_eq!(token.header.kid.as_deref(), Some(
            keys.signing_key(KeyPurpose::Token, SignatureAlgorithm::Rs256).unwrap().kid()
        ));

        let token = AccessToken::issue(
            &ctx,
            AccessTokenOptions::new("client", "alice").with_max(120).with_iat(NOW - 10),
        )
        .unwrap();
        assert_eq!(token.payload.exp - token.payload.iat, 120);
        assert_eq!(token.payload.iat, NOW - 10);
    }

    #[test]
    fn overflowing_lifetime_is_an_error() {
        let keys = keys();
        let clock = FixedClock::new(NOW);
        let ctx = IssuerContext {
            issuer: "https://op.test",
            keys: &keys,
            clock: &clock,
            random: &OsRandom,
        };

        let result = AccessToken::issue(&ctx, AccessTokenOptions::new("client", "alice").with_max(i64::MAX));
        assert!(matches!(result, Err(OidcError::Internal(_))));

        let result = IdToken::issue(&ctx, IdTokenOptions::new("client", "alice", None).with_max(i64::MAX));
        assert!(matches!(result, Err(OidcError::Internal(_))));
    }

    #[test]
    fn jti_is_unique() {
        let keys = keys();
        let clock = FixedClock::new(NOW);
        let random = SeededRandom::new([9; 32]);
        let ctx = IssuerContext {
            issuer: "https://op.test",
            keys: &keys,
            clock: &clock,
            random: &random,
        };

        let ids: HashSet<String> = (0..1000)
            .map(|_| {
                AccessToken::issue(&ctx, AccessTokenOptions::new("client", "alice"))
                    .unwrap()
                    .payload
                    .jti
            })
            .collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn encoded_access_token_verifies() {
        let keys = keys();
        let clock = FixedClock::new(NOW);
        let ctx = IssuerContext {
            issuer: "https://op.test",
            keys: &keys,
            clock: &clock,
            random: &OsRandom,
        };

        let token = AccessToken::issue(
            &ctx,
            AccessTokenOptions::new("client", "alice")
                .with_alg(SignatureAlgorithm::Rs384)
                .with_scope(Some("openid".to_string())),
        )
        .unwrap();
        let compact = token.encode().unwrap();
        assert_eq!(compact.split('.').count(), 3);

        let key = keys.find_by_kid(token.header.kid.as_deref().unwrap()).unwrap();
        let claims: AccessTokenClaims = key
            .verify(&compact, &signature_only(SignatureAlgorithm::Rs384))
            .unwrap();
        assert_eq!(claims, token.payload);
    }

    #[test]
    fn missing_key_is_a_key_resolution_error() {
        let keys = KeySet::new();
        let clock = FixedClock::new(NOW);
        let ctx = IssuerContext {
            issuer: "https://op.test",
            keys: &keys,
            clock: &clock,
            random: &OsRandom,
        };

        let err = IdToken::issue(&ctx, IdTokenOptions::new("client", "alice", None)).unwrap_err();
        assert!(matches!(
            err,
            OidcError::KeyResolution {
                purpose: KeyPurpose::IdToken,
                algorithm: SignatureAlgorithm::Rs256
            }
        ));
    }

    #[test]
    fn id_token_defaults_azp_to_aud() {
        let keys = keys();
        let clock = FixedClock::new(NOW);
        let ctx = IssuerContext {
            issuer: "https://op.test",
            keys: &keys,
            clock: &clock,
            random: &OsRandom,
        };

        let token = IdToken::issue(
            &ctx,
            IdTokenOptions::new("client", "alice", Some("n0nce".to_string()))
                .with_at_hash(hash_claim("t0ken", 256)),
        )
        .unwrap();

        assert_eq!(token.payload.azp.as_deref(), Some("client"));
        assert_eq!(token.payload.nonce.as_deref(), Some("n0nce"));
        assert_eq!(token.payload.at_hash.as_deref(), Some("tGwJZ3NDJh8LQ5pHJCIiXg"));
        assert_eq!(token.payload.exp - token.payload.iat, DEFAULT_MAX_AGE);
    }

    #[test]
    fn token_response_serializes_in_order() {
        let response = TokenResponse::new()
            .with_access_token("at", 3600)
            .with_code("c")
            .with_id_token("it");

        assert_eq!(
            serde_urlencoded::to_string(&response).unwrap(),
            "access_token=at&token_type=Bearer&expires_in=3600&code=c&id_token=it"
        );
    }
}

//! Registered client metadata.

use op_crypto::SignatureAlgorithm;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::error::{OidcError, OidcResult};
use crate::types::{ApplicationType, ClientAuthMethod, GrantType, RESPONSE_TYPES};

/// A registered relying party.
///
/// Metadata this type does not model is kept in [`Client::extra`] and
/// round-trips through the backend unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    /// Client identifier.
    pub client_id: String,

    /// Shared secret, absent for implicit-only clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Registered redirect URIs.
    #[serde(default)]
    pub redirect_uris: Vec<String>,

    /// Response types the client may use.
    #[serde(default = "default_response_types")]
    pub response_types: Vec<String>,

    /// Grant types the client may use.
    #[serde(default = "default_grant_types")]
    pub grant_types: Vec<GrantType>,

    /// Kind of application.
    #[serde(default)]
    pub application_type: ApplicationType,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,

    /// Inline JWK set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks: Option<Value>,

    /// URL of the client's JWK set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<String>,

    /// Algorithm for ID tokens issued to this client.
    #[serde(default = "default_id_token_alg")]
    pub id_token_signed_response_alg: SignatureAlgorithm,

    /// Algorithm for access tokens issued to this client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_signed_response_alg: Option<SignatureAlgorithm>,

    /// Algorithm request objects must be signed with (`none` allows
    /// unsigned objects).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_object_signing_alg: Option<String>,

    /// Token endpoint authentication method.
    #[serde(default)]
    pub token_endpoint_auth_method: ClientAuthMethod,

    /// Default token lifetime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_max_age: Option<i64>,

    /// URIs the end-user may be sent to after logout.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_logout_redirect_uris: Vec<String>,

    /// Front-channel logout URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontchannel_logout_uri: Option<String>,

    /// Whether front-channel logout needs `iss` and `sid`.
    #[serde(default)]
    pub frontchannel_logout_session_required: bool,

    /// Unrecognized registration metadata.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_response_types() -> Vec<String> {
    vec!["code".to_string()]
}

fn default_grant_types() -> Vec<GrantType> {
    vec![GrantType::AuthorizationCode]
}

const fn default_id_token_alg() -> SignatureAlgorithm {
    SignatureAlgorithm::Rs256
}

impl Client {
    /// Creates a client with default metadata.
    #[must_use]
    pub fn new(client_id: impl Into<String>, redirect_uris: Vec<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            redirect_uris,
            response_types: default_response_types(),
            grant_types: default_grant_types(),
            application_type: ApplicationType::default(),
            client_name: None,
            jwks: None,
            jwks_uri: None,
            id_token_signed_response_alg: default_id_token_alg(),
            access_token_signed_response_alg: None,
            request_object_signing_alg: None,
            token_endpoint_auth_method: ClientAuthMethod::default(),
            default_max_age: None,
            post_logout_redirect_uris: Vec::new(),
            frontchannel_logout_uri: None,
            frontchannel_logout_session_required: false,
            extra: Map::new(),
        }
    }

    /// Sets the client secret.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Sets the response types.
    #[must_use]
    pub fn with_response_types(mut self, response_types: &[&str]) -> Self {
        self.response_types = response_types.iter().map(|t| (*t).to_string()).collect();
        self
    }

    /// Sets the grant types.
    #[must_use]
    pub fn with_grant_types(mut self, grant_types: Vec<GrantType>) -> Self {
        self.grant_types = grant_types;
        self
    }

    /// Sets the post-logout redirect URIs.
    #[must_use]
    pub fn with_post_logout_redirect_uris(mut self, uris: Vec<String>) -> Self {
        self.post_logout_redirect_uris = uris;
        self
    }

    /// Sets the default token lifetime.
    #[must_use]
    pub const fn with_default_max_age(mut self, max_age: i64) -> Self {
        self.default_max_age = Some(max_age);
        self
    }

    /// Parses registration metadata.
    ///
    /// # Errors
    ///
    /// Returns `invalid_request` "Client validation error: ..." if a field
    /// has the wrong type or an unsupported value.
    pub fn from_metadata(metadata: Value) -> OidcResult<Self> {
        let client: Self = serde_json::from_value(metadata).map_err(validation_error)?;
        client.validate()?;
        Ok(client)
    }

    /// Checks field values that the type system does not constrain.
    ///
    /// # Errors
    ///
    /// Returns `invalid_request` "Client validation error: ..." naming the
    /// first offending field.
    pub fn validate(&self) -> OidcResult<()> {
        if self.redirect_uris.is_empty() {
            return Err(validation_error("redirect_uris must not be empty"));
        }

        let uris = self
            .redirect_uris
            .iter()
            .chain(&self.post_logout_redirect_uris)
            .chain(&self.frontchannel_logout_uri)
            .chain(&self.jwks_uri);
        for uri in uris {
            if Url::parse(uri).is_err() {
                return Err(validation_error(format!("{uri} is not an absolute URI")));
            }
        }

        if let Some(response_type) = self
            .response_types
            .iter()
            .find(|t| !RESPONSE_TYPES.contains(&t.as_str()))
        {
            return Err(validation_error(format!(
                "unsupported response type {response_type}"
            )));
        }

        if !self.id_token_signed_response_alg.is_rsa() {
            return Err(validation_error(format!(
                "unsupported id_token_signed_response_alg {}",
                self.id_token_signed_response_alg
            )));
        }

        if let Some(alg) = self.access_token_signed_response_alg
            && !alg.is_rsa()
        {
            return Err(validation_error(format!(
                "unsupported access_token_signed_response_alg {alg}"
            )));
        }

        Ok(())
    }

    /// Returns whether the client only uses the implicit flow and so gets
    /// no secret.
    #[must_use]
    pub fn is_implicit_only(&self) -> bool {
        self.response_types.len() == 1 && self.response_types[0] == "id_token token"
    }

    /// Returns whether a redirect URI, minus any fragment, is registered.
    #[must_use]
    pub fn has_redirect_uri(&self, uri: &str) -> bool {
        let uri = uri.split_once('#').map_or(uri, |(base, _)| base);
        self.redirect_uris.iter().any(|registered| registered == uri)
    }

    /// Returns whether a post-logout redirect URI is registered.
    #[must_use]
    pub fn has_post_logout_redirect_uri(&self, uri: &str) -> bool {
        self.post_logout_redirect_uris
            .iter()
            .any(|registered| registered == uri)
    }

    /// Returns the algorithm request objects must use, if signing is
    /// required.
    #[must_use]
    pub fn required_request_object_alg(&self) -> Option<&str> {
        self.request_object_signing_alg
            .as_deref()
            .filter(|alg| *alg != "none")
    }

    /// Returns whether unsigned request objects must be refused: the client
    /// either names a signing algorithm or pre-registered keys.
    #[must_use]
    pub fn requires_signed_request_object(&self) -> bool {
        self.required_request_object_alg().is_some() || self.jwks.is_some()
    }

    /// Returns the algorithm for access tokens.
    #[must_use]
    pub fn access_token_alg(&self) -> SignatureAlgorithm {
        self.access_token_signed_response_alg
            .unwrap_or(SignatureAlgorithm::Rs256)
    }
}

fn validation_error(detail: impl ToString) -> OidcError {
    OidcError::InvalidRequest(format!("Client validation error: {}", detail.to_string()))
}

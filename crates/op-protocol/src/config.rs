//! Provider configuration.

use serde::{Deserialize, Serialize};

use crate::types::RESPONSE_TYPES;

/// Configuration of an OpenID provider.
///
/// The supported-value lists are advertised in discovery and enforced by the
/// request validators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Issuer identifier; every endpoint URL is derived from it.
    pub issuer: String,

    /// Supported `response_type` values.
    pub response_types_supported: Vec<String>,

    /// Supported `response_mode` values.
    pub response_modes_supported: Vec<String>,

    /// Supported grant types.
    pub grant_types_supported: Vec<String>,

    /// Supported subject identifier types.
    pub subject_types_supported: Vec<String>,

    /// Algorithms ID tokens can be signed with.
    pub id_token_signing_alg_values_supported: Vec<String>,

    /// Token endpoint client authentication methods.
    pub token_endpoint_auth_methods_supported: Vec<String>,

    /// Algorithms accepted for JWT client assertions.
    pub token_endpoint_auth_signing_alg_values_supported: Vec<String>,

    /// Whether the `claims` parameter is supported.
    pub claims_parameter_supported: bool,

    /// Whether the `request` parameter is supported.
    pub request_parameter_supported: bool,

    /// Whether the `request_uri` parameter is supported.
    pub request_uri_parameter_supported: bool,

    /// Whether `request_uri` values must be pre-registered.
    pub require_request_uri_registration: bool,

    /// Authorization code lifetime in seconds.
    pub code_lifespan: i64,

    /// Token lifetime when neither the request nor the client sets one.
    pub default_max_age: i64,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost:8080".to_string(),
            response_types_supported: strings(&RESPONSE_TYPES),
            response_modes_supported: strings(&["query", "fragment"]),
            grant_types_supported: strings(&[
                "authorization_code",
                "implicit",
                "refresh_token",
                "client_credentials",
            ]),
            subject_types_supported: strings(&["public"]),
            id_token_signing_alg_values_supported: strings(&["RS256", "RS384", "RS512"]),
            token_endpoint_auth_methods_supported: strings(&[
                "client_secret_basic",
                "client_secret_post",
                "client_secret_jwt",
            ]),
            token_endpoint_auth_signing_alg_values_supported: strings(&[
                "HS256", "HS384", "HS512",
            ]),
            claims_parameter_supported: false,
            request_parameter_supported: true,
            request_uri_parameter_supported: false,
            require_request_uri_registration: false,
            code_lifespan: 600,
            default_max_age: 3600,
        }
    }
}

impl ProviderConfig {
    /// Creates a configuration with default settings for an issuer.
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        let issuer: String = issuer.into();
        Self {
            issuer: issuer.trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    /// Returns the URL of an endpoint below the issuer.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.issuer)
    }

    /// Authorization endpoint.
    #[must_use]
    pub fn authorization_endpoint(&self) -> String {
        self.endpoint("/authorize")
    }

    /// Token endpoint.
    #[must_use]
    pub fn token_endpoint(&self) -> String {
        self.endpoint("/token")
    }

    /// `UserInfo` endpoint.
    #[must_use]
    pub fn userinfo_endpoint(&self) -> String {
        self.endpoint("/userinfo")
    }

    /// JWK set document.
    #[must_use]
    pub fn jwks_uri(&self) -> String {
        self.endpoint("/jwks")
    }

    /// Dynamic registration endpoint.
    #[must_use]
    pub fn registration_endpoint(&self) -> String {
        self.endpoint("/register")
    }

    /// Session check iframe.
    #[must_use]
    pub fn check_session_iframe(&self) -> String {
        self.endpoint("/session")
    }

    /// RP-initiated logout endpoint.
    #[must_use]
    pub fn end_session_endpoint(&self) -> String {
        self.endpoint("/logout")
    }

    /// Returns whether `grant_type` is enabled.
    #[must_use]
    pub fn supports_grant_type(&self, grant_type: &str) -> bool {
        self.grant_types_supported.iter().any(|g| g == grant_type)
    }
}

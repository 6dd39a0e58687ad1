//! `OpenID` Connect Discovery 1.0 provider metadata.

use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;

/// `OpenID` Provider Metadata.
///
/// This is returned by the `.well-known/openid-configuration` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    /// Issuer identifier.
    pub issuer: String,

    /// URL of the authorization endpoint.
    pub authorization_endpoint: String,

    /// URL of the token endpoint.
    pub token_endpoint: String,

    /// URL of the `UserInfo` endpoint.
    pub userinfo_endpoint: String,

    /// URL of the JSON Web Key Set document.
    pub jwks_uri: String,

    /// URL of the dynamic client registration endpoint.
    pub registration_endpoint: String,

    /// URL of the session check iframe.
    pub check_session_iframe: String,

    /// URL of the RP-initiated logout endpoint.
    pub end_session_endpoint: String,

    /// Supported response types.
    pub response_types_supported: Vec<String>,

    /// Supported response modes.
    pub response_modes_supported: Vec<String>,

    /// Supported grant types.
    pub grant_types_supported: Vec<String>,

    /// Supported subject types.
    pub subject_types_supported: Vec<String>,

    /// ID token signing algorithms.
    pub id_token_signing_alg_values_supported: Vec<String>,

    /// Token endpoint authentication methods.
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
}

impl From<&ProviderConfig> for ProviderMetadata {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            issuer: config.issuer.clone(),
            authorization_endpoint: config.authorization_endpoint(),
            token_endpoint: config.token_endpoint(),
            userinfo_endpoint: config.userinfo_endpoint(),
            jwks_uri: config.jwks_uri(),
            registration_endpoint: config.registration_endpoint(),
            check_session_iframe: config.check_session_iframe(),
            end_session_endpoint: config.end_session_endpoint(),
            response_types_supported: config.response_types_supported.clone(),
            response_modes_supported: config.response_modes_supported.clone(),
            grant_types_supported: config.grant_types_supported.clone(),
            subject_types_supported: config.subject_types_supported.clone(),
            id_token_signing_alg_values_supported: config
                .id_token_signing_alg_values_supported
                .clone(),
            token_endpoint_auth_methods_supported: config
                .token_endpoint_auth_methods_supported
                .clone(),
            token_endpoint_auth_signing_alg_values_supported: config
                .token_endpoint_auth_signing_alg_values_supported
                .clone(),
            claims_parameter_supported: config.claims_parameter_supported,
            request_parameter_supported: config.request_parameter_supported,
            request_uri_parameter_supported: config.request_uri_parameter_supported,
            require_request_uri_registration: config.require_request_uri_registration,
        }
    }
}

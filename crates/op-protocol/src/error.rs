//! OIDC protocol error types.
//!
//! Protocol errors carry an OAuth 2.0 error code and a description and are
//! delivered to the client (as JSON, a redirect or a challenge). Everything
//! else is fatal and surfaces as a 500.

use op_crypto::{CryptoError, KeyPurpose, SignatureAlgorithm};
use op_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OIDC protocol and provider errors.
#[derive(Debug, Error)]
pub enum OidcError {
    /// Invalid request parameters.
    #[error("invalid_request: {0}")]
    InvalidRequest(String),

    /// Invalid, expired or replayed authorization grant.
    #[error("invalid_grant: {0}")]
    InvalidGrant(String),

    /// Client is unknown, unauthenticated or not authorized.
    #[error("unauthorized_client: {0}")]
    UnauthorizedClient(String),

    /// Unsupported grant type.
    #[error("unsupported_grant_type: {0}")]
    UnsupportedGrantType(String),

    /// Invalid scope.
    #[error("invalid_scope: {0}")]
    InvalidScope(String),

    /// Unsupported response type.
    #[error("unsupported_response_type: {0}")]
    UnsupportedResponseType(String),

    /// Unsupported response mode.
    #[error("unsupported_response_mode: {0}")]
    UnsupportedResponseMode(String),

    /// The request object is unusable.
    #[error("invalid_request_object: {0}")]
    InvalidRequestObject(String),

    /// The end-user denied the request.
    #[error("access_denied")]
    AccessDenied,

    /// No signing key is provisioned for a purpose and algorithm.
    #[error("no {purpose} signing key for {algorithm}")]
    KeyResolution {
        /// Key purpose.
        purpose: KeyPurpose,
        /// Requested algorithm.
        algorithm: SignatureAlgorithm,
    },

    /// Signing or key handling failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Backend failure.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// A value could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl OidcError {
    /// Returns the OAuth 2.0 error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidGrant(_) => "invalid_grant",
            Self::UnauthorizedClient(_) => "unauthorized_client",
            Self::UnsupportedGrantType(_) => "unsupported_grant_type",
            Self::InvalidScope(_) => "invalid_scope",
            Self::UnsupportedResponseType(_) => "unsupported_response_type",
            Self::UnsupportedResponseMode(_) => "unsupported_response_mode",
            Self::InvalidRequestObject(_) => "invalid_request_object",
            Self::AccessDenied => "access_denied",
            Self::KeyResolution { .. }
            | Self::Crypto(_)
            | Self::Storage(_)
            | Self::Serialization(_)
            | Self::Internal(_) => "server_error",
        }
    }

    /// Returns the human-readable description, if the error has one.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::InvalidRequest(d)
            | Self::InvalidGrant(d)
            | Self::UnauthorizedClient(d)
            | Self::UnsupportedGrantType(d)
            | Self::InvalidScope(d)
            | Self::UnsupportedResponseType(d)
            | Self::UnsupportedResponseMode(d)
            | Self::InvalidRequestObject(d) => Some(d),
            Self::AccessDenied
            | Self::KeyResolution { .. }
            | Self::Crypto(_)
            | Self::Storage(_)
            | Self::Serialization(_)
            | Self::Internal(_) => None,
        }
    }

    /// Returns whether this error is reported to the client rather than
    /// treated as a provider failure.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        !matches!(
            self,
            Self::KeyResolution { .. }
                | Self::Crypto(_)
                | Self::Storage(_)
                | Self::Serialization(_)
                | Self::Internal(_)
        )
    }

    /// Creates an error response for OAuth 2.0/OIDC.
    #[must_use]
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.error_code().to_string(),
            error_description: self.description().map(str::to_string),
        }
    }
}

/// OAuth 2.0 error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub error: String,

    /// Human-readable error description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

/// Result type for OIDC operations.
pub type OidcResult<T> = Result<T, OidcError>;

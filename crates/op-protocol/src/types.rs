//! Common OAuth 2.0 / OpenID Connect value types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Registered response types a client may use.
pub const RESPONSE_TYPES: [&str; 7] = [
    "code",
    "code token",
    "code id_token",
    "id_token",
    "id_token token",
    "code id_token token",
    "none",
];

/// How authorization responses are returned to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// Parameters in the query string.
    Query,

    /// Parameters in the fragment.
    Fragment,
}

impl ResponseMode {
    /// Returns the character separating the redirect URI from the
    /// response parameters.
    #[must_use]
    pub const fn delimiter(self) -> char {
        match self {
            Self::Query => '?',
            Self::Fragment => '#',
        }
    }

    /// Returns the mode name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Fragment => "fragment",
        }
    }

    /// Default mode for a response type: query for `code` and `none`,
    /// fragment for everything that returns tokens.
    #[must_use]
    pub fn default_for(response_type: Option<&str>) -> Self {
        match response_type {
            Some("code" | "none") => Self::Query,
            _ => Self::Fragment,
        }
    }

    /// Resolves the mode of a request: an explicit, known `response_mode`
    /// wins over the response type default.
    #[must_use]
    pub fn resolve(response_mode: Option<&str>, response_type: Option<&str>) -> Self {
        response_mode
            .and_then(|mode| mode.parse().ok())
            .unwrap_or_else(|| Self::default_for(response_type))
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query" => Ok(Self::Query),
            "fragment" => Ok(Self::Fragment),
            _ => Err(format!("unknown response mode: {s}")),
        }
    }
}

/// OAuth 2.0 grant types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    /// Authorization code grant (RFC 6749 Section 4.1).
    AuthorizationCode,

    /// Implicit grant (RFC 6749 Section 4.2).
    Implicit,

    /// Refresh token grant (RFC 6749 Section 6).
    RefreshToken,

    /// Client credentials grant (RFC 6749 Section 4.4).
    ClientCredentials,
}

impl GrantType {
    /// Returns the grant type name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::Implicit => "implicit",
            Self::RefreshToken => "refresh_token",
            Self::ClientCredentials => "client_credentials",
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrantType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authorization_code" => Ok(Self::AuthorizationCode),
            "implicit" => Ok(Self::Implicit),
            "refresh_token" => Ok(Self::RefreshToken),
            "client_credentials" => Ok(Self::ClientCredentials),
            _ => Err(format!("unknown grant type: {s}")),
        }
    }
}

/// Client authentication methods at the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
    /// HTTP Basic with the client secret.
    #[default]
    ClientSecretBasic,

    /// Client secret in the form body.
    ClientSecretPost,

    /// JWT assertion signed with the client secret.
    ClientSecretJwt,

    /// JWT assertion signed with the client's private key.
    PrivateKeyJwt,

    /// Public client.
    None,
}

impl ClientAuthMethod {
    /// Returns the method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClientSecretBasic => "client_secret_basic",
            Self::ClientSecretPost => "client_secret_post",
            Self::ClientSecretJwt => "client_secret_jwt",
            Self::PrivateKeyJwt => "private_key_jwt",
            Self::None => "none",
        }
    }
}

impl fmt::Display for ClientAuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of client application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationType {
    /// Web application.
    #[default]
    Web,

    /// Native application.
    Native,
}

/// Splits a space-delimited parameter into its values.
#[must_use]
pub fn split_values(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

/// Compares two space-delimited value lists ignoring order.
#[must_use]
pub fn same_values(a: &str, b: &str) -> bool {
    let mut a: Vec<&str> = a.split_whitespace().collect();
    let mut b: Vec<&str> = b.split_whitespace().collect();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

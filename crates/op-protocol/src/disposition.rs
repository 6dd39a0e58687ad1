//! Response dispositions and the short-circuiting step type.
//!
//! Every handler produces a [`Disposition`]: a transport-neutral status,
//! header list and body. Intermediate steps return [`Step`], where
//! [`Halt::Respond`] ends the chain with a response the client should see
//! and [`Halt::Fail`] ends it with a provider failure.

use op_crypto::CryptoError;
use op_store::StoreError;
use serde::Serialize;
use serde_json::Value;

use crate::error::{OidcError, OidcResult};
use crate::types::ResponseMode;

/// Response body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// `text/plain` body.
    Text(String),
    /// `application/json` body.
    Json(Value),
}

/// A complete HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disposition {
    /// Status code.
    pub status: u16,

    /// Response headers, in order.
    pub headers: Vec<(String, String)>,

    /// Response body.
    pub body: Body,
}

impl Disposition {
    /// Creates an empty response with the given status.
    #[must_use]
    pub const fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Body::Empty,
        }
    }

    /// JSON response.
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            body: Body::Json(body),
            ..Self::new(status)
        }
    }

    /// 204 with no body.
    #[must_use]
    pub const fn no_content() -> Self {
        Self::new(204)
    }

    /// 302 to `location`.
    #[must_use]
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::new(302).with_header("Location", location)
    }

    /// 400 with a JSON error body.
    #[must_use]
    pub fn bad_request(error: &OidcError) -> Self {
        let body = serde_json::to_value(error.to_error_response()).unwrap_or(Value::Null);
        Self::json(400, body).no_store()
    }

    /// 401 with a Bearer challenge.
    #[must_use]
    pub fn unauthorized(realm: &str, error: &OidcError) -> Self {
        let challenge = format!(
            "Bearer realm=\"{realm}\", error=\"{}\", error_description=\"{}\"",
            error.error_code(),
            error.description().unwrap_or_default()
        );

        Self {
            body: Body::Text("Unauthorized".to_string()),
            ..Self::new(401)
        }
        .with_header("WWW-Authenticate", challenge)
    }

    /// 403.
    #[must_use]
    pub fn forbidden() -> Self {
        Self {
            body: Body::Text("Forbidden".to_string()),
            ..Self::new(403)
        }
    }

    /// 500.
    #[must_use]
    pub fn internal_server_error() -> Self {
        Self {
            body: Body::Text("Internal Server Error".to_string()),
            ..Self::new(500)
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Forbids caching of the response.
    #[must_use]
    pub fn no_store(self) -> Self {
        self.with_header("Cache-Control", "no-store")
            .with_header("Pragma", "no-cache")
    }

    /// Returns the first header with the given name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the `Location` header.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.header("Location")
    }

    /// Returns the JSON body.
    #[must_use]
    pub const fn json_body(&self) -> Option<&Value> {
        match &self.body {
            Body::Json(value) => Some(value),
            Body::Empty | Body::Text(_) => None,
        }
    }
}

/// Why a chain of steps stopped early.
#[derive(Debug)]
pub enum Halt {
    /// Send this response.
    Respond(Disposition),
    /// Provider failure; answered with a 500.
    Fail(OidcError),
}

impl From<Disposition> for Halt {
    fn from(disposition: Disposition) -> Self {
        Self::Respond(disposition)
    }
}

impl From<OidcError> for Halt {
    fn from(error: OidcError) -> Self {
        Self::Fail(error)
    }
}

impl From<StoreError> for Halt {
    fn from(error: StoreError) -> Self {
        Self::Fail(error.into())
    }
}

impl From<CryptoError> for Halt {
    fn from(error: CryptoError) -> Self {
        Self::Fail(error.into())
    }
}

impl From<serde_json::Error> for Halt {
    fn from(error: serde_json::Error) -> Self {
        Self::Fail(error.into())
    }
}

/// Result of a step in a request chain.
pub type Step<T> = Result<T, Halt>;

/// Turns the outcome of a request chain into the response to send.
#[must_use]
pub fn finish(step: Step<Disposition>) -> Disposition {
    match step {
        Ok(disposition) | Err(Halt::Respond(disposition)) => disposition,
        Err(Halt::Fail(error)) => {
            tracing::error!(error = %error, "request failed");
            Disposition::internal_server_error()
        }
    }
}

/// Builds a redirect carrying `data` (and `state`, when present) in the
/// query or fragment of `uri`, merging with parameters already there.
///
/// # Errors
///
/// Returns an error if `data` does not serialize to flat parameters.
pub fn redirect_with<T: Serialize>(
    uri: &str,
    mode: ResponseMode,
    data: &T,
    state: Option<&str>,
) -> OidcResult<Disposition> {
    let mut encoded =
        serde_urlencoded::to_string(data).map_err(|e| OidcError::Internal(e.to_string()))?;

    if let Some(state) = state {
        if !encoded.is_empty() {
            encoded.push('&');
        }
        encoded.push_str("state=");
        encoded.push_str(&urlencoding::encode(state));
    }

    Ok(Disposition::redirect(append_parameters(uri, mode, &encoded)))
}

/// Appends encoded parameters to the query or fragment of `uri`.
#[must_use]
pub fn append_parameters(uri: &str, mode: ResponseMode, encoded: &str) -> String {
    if encoded.is_empty() {
        return uri.to_string();
    }

    let (base, fragment) = match uri.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (uri, None),
    };

    match mode {
        ResponseMode::Query => {
            let separator = query_separator(base);
            match fragment {
                Some(fragment) => format!("{base}{separator}{encoded}#{fragment}"),
                None => format!("{base}{separator}{encoded}"),
            }
        }
        ResponseMode::Fragment => match fragment {
            Some(fragment) if !fragment.is_empty() && !fragment.ends_with('&') => {
                format!("{base}#{fragment}&{encoded}")
            }
            Some(fragment) => format!("{base}#{fragment}{encoded}"),
            None => format!("{base}#{encoded}"),
        },
    }
}

fn query_separator(base: &str) -> &'static str {
    if !base.contains('?') {
        "?"
    } else if base.ends_with('?') || base.ends_with('&') {
        ""
    } else {
        "&"
    }
}

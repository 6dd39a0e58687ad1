//! Transport-neutral HTTP request.
//!
//! The transport adapter fills an [`HttpRequest`] from whatever server it
//! runs in; validators read parameters through [`Params`].

use std::collections::BTreeMap;

use op_crypto::jose::JsonObject;
use serde_json::Value;

/// HTTP method of an incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    /// GET.
    #[default]
    Get,
    /// POST.
    Post,
    /// Anything else.
    Other,
}

/// An incoming HTTP request, already parsed by the transport.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    /// Request method.
    pub method: HttpMethod,

    /// Query string parameters.
    pub query: BTreeMap<String, String>,

    /// `application/x-www-form-urlencoded` body parameters.
    pub form: BTreeMap<String, String>,

    /// `application/json` body.
    pub json: Option<Value>,

    headers: BTreeMap<String, String>,
}

impl HttpRequest {
    /// Creates an empty request.
    #[must_use]
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Creates a GET request with query parameters.
    #[must_use]
    pub fn get<K, V>(query: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(HttpMethod::Get).with_query(query)
    }

    /// Creates a POST request with form parameters.
    #[must_use]
    pub fn post_form<K, V>(form: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(HttpMethod::Post).with_form(form)
    }

    /// Creates a POST request with a JSON body.
    #[must_use]
    pub fn post_json(body: Value) -> Self {
        Self::new(HttpMethod::Post).with_json(body)
    }

    /// Adds query parameters.
    #[must_use]
    pub fn with_query<K, V>(mut self, query: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(query.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Adds form parameters.
    #[must_use]
    pub fn with_form<K, V>(mut self, form: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.form
            .extend(form.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    /// Adds a header. Names are case-insensitive.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Returns a header value.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns the request parameters: the query for GET, the form body
    /// otherwise.
    #[must_use]
    pub fn params(&self) -> Params {
        let source = match self.method {
            HttpMethod::Get => &self.query,
            HttpMethod::Post | HttpMethod::Other => &self.form,
        };
        Params(source.clone())
    }
}

/// Request parameters.
///
/// Empty values read as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    /// Returns a non-empty parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Returns whether a non-empty parameter is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Sets a parameter.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Overlays claims from a request object. Strings are taken as-is,
    /// other JSON values in their serialized form.
    pub fn merge_claims(&mut self, claims: &JsonObject) {
        for (name, value) in claims {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Null => continue,
                other => other.to_string(),
            };
            self.0.insert(name.clone(), value);
        }
    }

    /// Iterates over all parameters.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

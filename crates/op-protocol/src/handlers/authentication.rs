//! Authorization endpoint.
//!
//! Chain: load client → request object → validate → host authenticate →
//! host consent → allow or deny.

use op_crypto::jose::{JsonObject, import_jwk, import_jwk_set, verify_with_jwk, verify_with_secret};
use op_crypto::{DecodedJwt, SignatureAlgorithm};
use serde::Serialize;
use serde_json::{Value, json};

use crate::client::Client;
use crate::code::AuthorizationCode;
use crate::config::ProviderConfig;
use crate::disposition::{Disposition, Halt, Step, redirect_with};
use crate::error::{OidcError, OidcResult};
use crate::host::Subject;
use crate::provider::Provider;
use crate::request::{HttpRequest, Params};
use crate::token::{AccessToken, IdToken, Issuance, MAX_LIFETIME, TokenResponse};
use crate::types::{ResponseMode, same_values, split_values};

/// A validated authentication request on its way through the host.
#[derive(Debug, Clone)]
pub struct AuthenticationRequest {
    params: Params,
    response_types: Vec<String>,
    response_mode: ResponseMode,
    client: Client,
    subject: Option<Subject>,
    consent: bool,
    cnf: Option<Value>,
}

impl AuthenticationRequest {
    /// Creates a request from its parameters and the client it names.
    #[must_use]
    pub fn new(params: Params, client: Client) -> Self {
        let response_types = params
            .get("response_type")
            .map(split_values)
            .unwrap_or_default();
        let response_mode =
            ResponseMode::resolve(params.get("response_mode"), params.get("response_type"));

        Self {
            params,
            response_types,
            response_mode,
            client,
            subject: None,
            consent: false,
            cnf: None,
        }
    }

    /// Sets the authenticated subject.
    #[must_use]
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Sets the consent decision.
    #[must_use]
    pub const fn with_consent(mut self, consent: bool) -> Self {
        self.consent = consent;
        self
    }

    /// Binds issued tokens to a proof-of-possession key.
    #[must_use]
    pub fn with_cnf(mut self, cnf: Option<Value>) -> Self {
        self.cnf = cnf;
        self
    }

    /// Returns the request parameters, request object claims included.
    #[must_use]
    pub const fn params(&self) -> &Params {
        &self.params
    }

    /// Returns the client.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Returns the authenticated subject.
    #[must_use]
    pub const fn subject(&self) -> Option<&Subject> {
        self.subject.as_ref()
    }

    /// Returns whether the end-user consented.
    #[must_use]
    pub const fn consent(&self) -> bool {
        self.consent
    }

    /// Returns the proof-of-possession confirmation.
    #[must_use]
    pub const fn cnf(&self) -> Option<&Value> {
        self.cnf.as_ref()
    }

    /// Returns the requested response types, in request order.
    #[must_use]
    pub fn response_types(&self) -> &[String] {
        &self.response_types
    }

    /// Returns whether `response_type` includes `value`.
    #[must_use]
    pub fn includes_response_type(&self, value: &str) -> bool {
        self.response_types.iter().any(|t| t == value)
    }

    /// Returns how the response is delivered.
    #[must_use]
    pub const fn response_mode(&self) -> ResponseMode {
        self.response_mode
    }

    /// Returns a positive `max_age` parameter, capped at
    /// [`MAX_LIFETIME`].
    #[must_use]
    pub fn max_age(&self) -> Option<i64> {
        self.params
            .get("max_age")
            .and_then(|max| max.parse::<i64>().ok())
            .filter(|max| *max > 0)
            .map(|max| max.min(MAX_LIFETIME))
    }

    /// Returns whether the response type is one the provider supports.
    /// Order of the space-delimited values does not matter.
    #[must_use]
    pub fn supported_response_type(&self, config: &ProviderConfig) -> bool {
        self.params.get("response_type").is_some_and(|requested| {
            config
                .response_types_supported
                .iter()
                .any(|supported| same_values(supported, requested))
        })
    }

    /// Returns whether the response mode, if any, is supported.
    #[must_use]
    pub fn supported_response_mode(&self, config: &ProviderConfig) -> bool {
        self.params.get("response_mode").is_none_or(|requested| {
            config
                .response_modes_supported
                .iter()
                .any(|supported| supported == requested)
        })
    }

    /// Returns whether a nonce is present where the response type needs
    /// one.
    #[must_use]
    pub fn required_nonce_provided(&self) -> bool {
        let requires_nonce =
            self.includes_response_type("id_token") || self.includes_response_type("token");
        !requires_nonce || self.params.contains("nonce")
    }

    /// Redirects to the client with `data` and the request's `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` does not encode as parameters.
    pub fn redirect<T: Serialize>(&self, data: &T) -> OidcResult<Disposition> {
        redirect_with(
            self.params.get("redirect_uri").unwrap_or_default(),
            self.response_mode,
            data,
            self.params.get("state"),
        )
    }

    fn redirect_error(&self, error: &OidcError) -> Halt {
        tracing::debug!(client_id = %self.client.client_id, error = %error, "rejected authentication request");
        match self.redirect(&error.to_error_response()) {
            Ok(disposition) => disposition.into(),
            Err(e) => e.into(),
        }
    }
}

/// Handles an authentication request.
///
/// # Errors
///
/// Halts with the error disposition of the first failed check.
pub async fn handle(provider: &Provider, request: HttpRequest) -> Step<Disposition> {
    let mut params = request.params();
    let client = match params.get("client_id") {
        Some(client_id) => provider.get_client(client_id).await?,
        None => None,
    };

    let mut cnf = None;
    if let (Some(object), Some(client)) = (params.get("request"), client.as_ref()) {
        let object = object.to_string();
        cnf = decode_request_param(&mut params, client, &object)?;
    }

    let request = validate(provider, params, client)?.with_cnf(cnf);
    let request = provider.host().authenticate(request).await?;
    let request = provider.host().obtain_consent(request).await?;

    authorize(provider, request).await
}

/// Checks the request in order, returning the first failure.
///
/// # Errors
///
/// Halts with 403, 400 or 401 while the redirect URI is untrusted, and
/// with an error redirect afterwards.
pub fn validate(
    provider: &Provider,
    params: Params,
    client: Option<Client>,
) -> Step<AuthenticationRequest> {
    if !params.contains("client_id") {
        tracing::debug!("authentication request without client id");
        return Err(Disposition::forbidden().into());
    }

    let Some(redirect_uri) = params.get("redirect_uri") else {
        return Err(bad_request(OidcError::InvalidRequest("Missing redirect uri".to_string())));
    };

    let Some(client) = client else {
        return Err(Disposition::unauthorized(
            provider.issuer(),
            &OidcError::UnauthorizedClient("Unknown client".to_string()),
        )
        .into());
    };

    if !client.has_redirect_uri(redirect_uri) {
        return Err(bad_request(OidcError::InvalidRequest(
            "Mismatching redirect uri".to_string(),
        )));
    }

    let request = AuthenticationRequest::new(params, client);
    let params = request.params();

    if !params.contains("response_type") {
        return Err(request.redirect_error(&OidcError::InvalidRequest(
            "Missing response type".to_string(),
        )));
    }

    let Some(scope) = params.get("scope") else {
        return Err(request.redirect_error(&OidcError::InvalidScope("Missing scope".to_string())));
    };

    if !scope.split_whitespace().any(|s| s == "openid") {
        return Err(request.redirect_error(&OidcError::InvalidScope(
            "Missing openid scope".to_string(),
        )));
    }

    if !request.required_nonce_provided() {
        return Err(request.redirect_error(&OidcError::InvalidRequest("Missing nonce".to_string())));
    }

    if !request.supported_response_type(provider.config()) {
        return Err(request.redirect_error(&OidcError::UnsupportedResponseType(
            "Unsupported response type".to_string(),
        )));
    }

    if !request.supported_response_mode(provider.config()) {
        return Err(request.redirect_error(&OidcError::UnsupportedResponseMode(
            "Unsupported response mode".to_string(),
        )));
    }

    Ok(request)
}

/// Allows or denies the request according to the host's consent decision.
///
/// # Errors
///
/// Fails on issuance or storage errors.
pub async fn authorize(provider: &Provider, request: AuthenticationRequest) -> Step<Disposition> {
    if request.consent() {
        allow(provider, &request).await
    } else {
        deny(&request)
    }
}

async fn allow(provider: &Provider, request: &AuthenticationRequest) -> Step<Disposition> {
    let source = Issuance::Authentication(request);
    let mut response = TokenResponse::new();

    if request.includes_response_type("token") {
        response = AccessToken::issue_for_request(provider, &source, response).await?;
    }

    if request.includes_response_type("code") {
        let code = AuthorizationCode::issue(provider, request).await?;
        response = response.with_code(code.code);
    }

    if request.includes_response_type("id_token") {
        response = IdToken::issue_for_request(provider, &source, response)?;
    }

    Ok(request.redirect(&response)?)
}

fn deny(request: &AuthenticationRequest) -> Step<Disposition> {
    tracing::debug!(client_id = %request.client().client_id, "end-user denied consent");
    Ok(request.redirect(&OidcError::AccessDenied.to_error_response())?)
}

/// Validates the `request` parameter and merges its claims into `params`.
///
/// Returns the `cnf` confirmation to bind tokens to, if the object
/// carries a key.
fn decode_request_param(
    params: &mut Params,
    client: &Client,
    object: &str,
) -> Step<Option<Value>> {
    let fail = |params: &Params, error: OidcError| request_object_error(params, client, error);

    let Ok(jwt) = DecodedJwt::decode(object) else {
        return Err(fail(
            params,
            OidcError::InvalidRequestObject("Invalid JWT compact serialization".to_string()),
        ));
    };
    let payload = &jwt.payload;

    if payload.contains_key("request") {
        return Err(fail(
            params,
            OidcError::InvalidRequestObject("Illegal request claim in payload".to_string()),
        ));
    }

    if payload.contains_key("request_uri") {
        return Err(fail(
            params,
            OidcError::InvalidRequestObject("Illegal request_uri claim in payload".to_string()),
        ));
    }

    if let Some(client_id) = payload.get("client_id")
        && client_id.as_str() != params.get("client_id")
    {
        tracing::debug!("request object names another client");
        return Err(Disposition::forbidden().into());
    }

    if let Some(response_type) = payload.get("response_type")
        && !claim_matches(response_type, params.get("response_type"))
    {
        return Err(fail(
            params,
            OidcError::InvalidRequest("Mismatching response type in request object".to_string()),
        ));
    }

    if let Some(scope) = payload.get("scope")
        && !claim_matches(scope, params.get("scope"))
    {
        return Err(fail(
            params,
            OidcError::InvalidScope("Mismatching scope in request object".to_string()),
        ));
    }

    if let Err(error) = verify_request_object(&jwt, object, client) {
        return Err(fail(params, error));
    }

    let cnf = match payload.get("cnf").and_then(|cnf| cnf.get("jwk")) {
        Some(jwk) => match import_jwk(jwk) {
            Ok(_) => Some(json!({ "jwk": jwk })),
            Err(e) => {
                tracing::debug!(error = %e, "unusable proof-of-possession key");
                return Err(fail(
                    params,
                    OidcError::InvalidRequestObject("Invalid proof-of-possession key".to_string()),
                ));
            }
        },
        None => None,
    };

    let mut claims = payload.clone();
    claims.remove("cnf");
    params.merge_claims(&claims);

    Ok(cnf)
}

fn claim_matches(claim: &Value, param: Option<&str>) -> bool {
    match (claim.as_str(), param) {
        (Some(claim), Some(param)) => same_values(claim, param),
        _ => false,
    }
}

/// Checks the request object signature against what the client
/// registered.
fn verify_request_object(jwt: &DecodedJwt, object: &str, client: &Client) -> OidcResult<()> {
    let required = client.required_request_object_alg();

    if !jwt.is_signed() {
        if client.requires_signed_request_object() {
            return Err(OidcError::InvalidRequest(
                "Signed request object required".to_string(),
            ));
        }
        return Ok(());
    }

    let alg = jwt.alg().unwrap_or_default();
    if required.is_some_and(|required| required != alg) {
        return Err(OidcError::InvalidRequest(
            "Mismatching request object signing algorithm".to_string(),
        ));
    }

    let invalid = || OidcError::InvalidRequest("Invalid request object signature".to_string());
    let alg: SignatureAlgorithm = alg.parse().map_err(|_| invalid())?;

    let verified: Option<JsonObject> = if alg.is_hmac() {
        client
            .client_secret
            .as_deref()
            .and_then(|secret| verify_with_secret(object, alg, secret.as_bytes()).ok())
    } else {
        let keys = client.jwks.as_ref().map(import_jwk_set).unwrap_or_default();
        keys.iter()
            .filter(|key| match (jwt.kid(), key.common.key_id.as_deref()) {
                (Some(kid), Some(key_id)) => kid == key_id,
                _ => true,
            })
            .find_map(|key| verify_with_jwk(object, alg, key).ok())
    };

    verified.map(|_| ()).ok_or_else(invalid)
}

/// Delivers a request object error by redirect only when the redirect
/// URI is registered for the client.
fn request_object_error(
    params: &Params,
    client: &Client,
    error: OidcError,
) -> Halt {
    let trusted = params
        .get("redirect_uri")
        .is_some_and(|uri| client.has_redirect_uri(uri));

    if !trusted {
        return bad_request(error);
    }

    AuthenticationRequest::new(params.clone(), client.clone()).redirect_error(&error)
}

fn bad_request(error: OidcError) -> Halt {
    tracing::debug!(error = %error, "rejected authentication request");
    Disposition::bad_request(&error).into()
}

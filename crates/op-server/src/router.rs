//! Router configuration.
//!
//! Maps the provider endpoints onto axum routes. Requests are turned into
//! transport-neutral [`HttpRequest`] values and the resulting
//! [`Disposition`] is written back out as an axum response.

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use op_protocol::{Body, Disposition, Endpoint, HttpMethod, HttpRequest};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Creates the application router.
///
/// | Method     | Path                                 | Endpoint         |
/// |------------|--------------------------------------|------------------|
/// | GET, POST  | `/authorize`                         | Authentication   |
/// | POST       | `/token`                             | Token            |
/// | POST       | `/register`                          | Registration     |
/// | GET, POST  | `/logout`                            | Logout           |
/// | GET        | `/.well-known/openid-configuration`  | Discovery        |
/// | GET        | `/jwks`                              | JWK set          |
/// | GET        | `/health`                            | Liveness         |
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/authorize", get(authorize).post(authorize))
        .route("/token", axum::routing::post(token))
        .route("/register", axum::routing::post(register))
        .route("/logout", get(logout).post(logout))
        .route("/.well-known/openid-configuration", get(discovery))
        .route("/jwks", get(jwks))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Axum response wrapper for a [`Disposition`].
#[derive(Debug)]
pub struct DispositionResponse(pub Disposition);

impl IntoResponse for DispositionResponse {
    fn into_response(self) -> Response {
        let Disposition {
            status,
            headers,
            body,
        } = self.0;

        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = match body {
            Body::Empty => status.into_response(),
            Body::Text(text) => (status, text).into_response(),
            Body::Json(value) => (status, Json(value)).into_response(),
        };

        for (name, value) in headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().append(name, value);
                }
                _ => tracing::warn!(header = %name, "dropping unrepresentable response header"),
            }
        }

        response
    }
}

/// Builds the transport-neutral request from the parts axum extracted.
///
/// Form bodies become parameters, JSON bodies are kept as-is; a body that
/// fails to parse is treated as absent.
#[must_use]
pub fn http_request(
    method: &Method,
    headers: &HeaderMap,
    query: BTreeMap<String, String>,
    body: &Bytes,
) -> HttpRequest {
    let method = match *method {
        Method::GET => HttpMethod::Get,
        Method::POST => HttpMethod::Post,
        _ => HttpMethod::Other,
    };

    let mut request = HttpRequest::new(method).with_query(query);

    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }

    if body.is_empty() {
        return request;
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with("application/json") {
        match serde_json::from_slice(body) {
            Ok(json) => request = request.with_json(json),
            Err(e) => tracing::debug!(error = %e, "ignoring malformed JSON body"),
        }
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        match serde_urlencoded::from_bytes::<Vec<(String, String)>>(body) {
            Ok(form) => request = request.with_form(form),
            Err(e) => tracing::debug!(error = %e, "ignoring malformed form body"),
        }
    }

    request
}

async fn dispatch(
    state: &AppState,
    endpoint: Endpoint,
    method: &Method,
    headers: &HeaderMap,
    query: BTreeMap<String, String>,
    body: &Bytes,
) -> DispositionResponse {
    let request = http_request(method, headers, query, body);
    DispositionResponse(state.provider.handle(endpoint, request).await)
}

async fn authorize(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
    body: Bytes,
) -> DispositionResponse {
    dispatch(&state, Endpoint::Authentication, &method, &headers, query, &body).await
}

async fn token(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
    body: Bytes,
) -> DispositionResponse {
    dispatch(&state, Endpoint::Token, &method, &headers, query, &body).await
}

async fn register(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
    body: Bytes,
) -> DispositionResponse {
    dispatch(&state, Endpoint::Registration, &method, &headers, query, &body).await
}

async fn logout(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
    body: Bytes,
) -> DispositionResponse {
    dispatch(&state, Endpoint::Logout, &method, &headers, query, &body).await
}

async fn discovery(State(state): State<AppState>) -> DispositionResponse {
    DispositionResponse(
        state
            .provider
            .handle(Endpoint::Discovery, HttpRequest::new(HttpMethod::Get))
            .await,
    )
}

async fn jwks(State(state): State<AppState>) -> DispositionResponse {
    DispositionResponse(
        state
            .provider
            .handle(Endpoint::JwkSet, HttpRequest::new(HttpMethod::Get))
            .await,
    )
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

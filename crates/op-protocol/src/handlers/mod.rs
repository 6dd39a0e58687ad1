//! Endpoint handlers.
//!
//! Each endpoint owns its validation chain; [`dispatch`] picks the chain.

pub mod authentication;
pub mod logout;
pub mod metadata;
pub mod registration;
pub mod token;

use crate::disposition::{Disposition, Step};
use crate::provider::Provider;
use crate::request::HttpRequest;

/// Provider endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Authorization endpoint.
    Authentication,
    /// Token endpoint.
    Token,
    /// Dynamic client registration.
    Registration,
    /// RP-initiated logout.
    Logout,
    /// `.well-known/openid-configuration`.
    Discovery,
    /// JWK set document.
    JwkSet,
}

/// Runs the chain for `endpoint`.
pub async fn dispatch(
    provider: &Provider,
    endpoint: Endpoint,
    request: HttpRequest,
) -> Step<Disposition> {
    match endpoint {
        Endpoint::Authentication => authentication::handle(provider, request).await,
        Endpoint::Token => token::handle(provider, request).await,
        Endpoint::Registration => registration::handle(provider, request).await,
        Endpoint::Logout => logout::handle(provider, request).await,
        Endpoint::Discovery => metadata::discovery(provider),
        Endpoint::JwkSet => metadata::jwk_set(provider),
    }
}

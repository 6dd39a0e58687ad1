//! # op-protocol
//!
//! OpenID Connect provider core. Transport-agnostic: requests come in as
//! [`HttpRequest`] values and every endpoint answers with a
//! [`Disposition`] for the HTTP layer to write out.
//!
//! ## Modules
//!
//! - [`provider`] - The provider and its builder
//! - [`handlers`] - Authorization, token, registration, logout and metadata endpoints
//! - [`token`] - Access token and ID token issuance
//! - [`code`] - Single-use authorization codes
//! - [`client_auth`] - Token endpoint client authentication
//! - [`client`] - Registered client metadata
//! - [`host`] - Hooks into the host application (login, consent, logout)
//! - [`disposition`] - Responses and the request chain control flow
//! - [`config`] - Provider configuration
//! - [`discovery`] - OpenID provider metadata
//! - [`request`] - Transport-neutral request and parameters
//! - [`clock`] - Injectable time source
//! - [`types`] - Protocol enumerations
//! - [`error`] - Error types

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod client;
pub mod client_auth;
pub mod clock;
pub mod code;
pub mod config;
pub mod discovery;
pub mod disposition;
pub mod error;
pub mod handlers;
pub mod host;
pub mod provider;
pub mod request;
pub mod token;
pub mod types;

pub use client::Client;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ProviderConfig;
pub use discovery::ProviderMetadata;
pub use disposition::{Body, Disposition, Halt, Step};
pub use error::{ErrorResponse, OidcError, OidcResult};
pub use handlers::Endpoint;
pub use handlers::authentication::AuthenticationRequest;
pub use handlers::logout::LogoutRequest;
pub use host::{Host, StaticHost, Subject};
pub use provider::{Provider, ProviderBuilder};
pub use request::{HttpMethod, HttpRequest, Params};
pub use token::TokenResponse;

//! Host application hooks.
//!
//! The provider does not render pages or keep sessions. It hands the
//! validated request to the host to sign the end-user in, collect consent,
//! and end sessions. Each hook either returns the (possibly updated)
//! request to continue or halts with a response of its own, such as a
//! redirect to a login page.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::disposition::{Disposition, Step};
use crate::handlers::authentication::AuthenticationRequest;
use crate::handlers::logout::LogoutRequest;

/// Authenticated end-user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Subject identifier, used as the `sub` claim.
    #[serde(rename = "_id")]
    pub id: String,
}

impl Subject {
    /// Creates a subject.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Callbacks into the host application.
#[async_trait]
pub trait Host: Send + Sync {
    /// Authenticates the end-user, setting the request's subject.
    async fn authenticate(&self, request: AuthenticationRequest) -> Step<AuthenticationRequest>;

    /// Records whether the end-user consents to the request.
    async fn obtain_consent(&self, request: AuthenticationRequest)
    -> Step<AuthenticationRequest>;

    /// Ends the end-user's session.
    async fn logout(&self, request: LogoutRequest) -> Step<LogoutRequest>;
}

/// Host that signs in a fixed subject and answers consent with a fixed
/// decision.
///
/// With no subject configured the authorization endpoint answers 403.
#[derive(Debug, Clone, Default)]
pub struct StaticHost {
    subject: Option<Subject>,
    consent: bool,
}

impl StaticHost {
    /// Signs in `subject` and grants consent.
    #[must_use]
    pub fn new(subject: Subject) -> Self {
        Self {
            subject: Some(subject),
            consent: true,
        }
    }

    /// Sets the consent decision.
    #[must_use]
    pub const fn with_consent(mut self, consent: bool) -> Self {
        self.consent = consent;
        self
    }
}

#[async_trait]
impl Host for StaticHost {
    async fn authenticate(&self, request: AuthenticationRequest) -> Step<AuthenticationRequest> {
        match &self.subject {
            Some(subject) => Ok(request.with_subject(subject.clone())),
            None => Err(Disposition::forbidden().into()),
        }
    }

    async fn obtain_consent(
        &self,
        request: AuthenticationRequest,
    ) -> Step<AuthenticationRequest> {
        Ok(request.with_consent(self.consent))
    }

    async fn logout(&self, request: LogoutRequest) -> Step<LogoutRequest> {
        tracing::debug!("static host has no session to end");
        Ok(request)
    }
}

//! Credential resolvers
//!
//! Each resolver turns one kind of raw credential into an [`AuthOutcome`].
//! They share a uniform contract so the façade can run them as an ordered
//! chain: the first resolver that accepts a credential decides the outcome,
//! and every failure (unknown, expired, undecodable, store error) collapses
//! to `None`.

use async_trait::async_trait;
use agora_users_core::Principal;
use serde::Serialize;
use std::borrow::Cow;

pub mod oauth;
pub mod pat;
pub mod session;

pub use oauth::{Grant, GrantProps, OAuthResolver, TokenUnwrapper, UnwrappedToken};
pub use pat::PatResolver;
pub use session::{session_id_from_cookie_header, SessionResolver};

/// Result of a successful credential resolution. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthOutcome {
    pub principal: Principal,
    /// `None` for first-party sessions, which are not limited by API scopes.
    /// `Some(vec![])` is a token with no scopes and is denied everything.
    pub granted_scopes: Option<Vec<String>>,
}

impl AuthOutcome {
    pub fn session(principal: Principal) -> Self {
        Self { principal, granted_scopes: None }
    }

    pub fn token(principal: Principal, scopes: Vec<String>) -> Self {
        Self { principal, granted_scopes: Some(scopes) }
    }

    pub fn is_session(&self) -> bool {
        self.granted_scopes.is_none()
    }
}

/// A raw credential lifted from the request
#[derive(Clone, PartialEq, Eq)]
pub enum Credential<'a> {
    /// Value of an `Authorization: Bearer` header
    Bearer(&'a str),
    /// Every `Cookie` header of the request, joined with `"; "`
    Cookie(Cow<'a, str>),
}

impl std::fmt::Debug for Credential<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Credential::Cookie(_) => f.write_str("Cookie(<redacted>)"),
        }
    }
}

#[async_trait]
pub trait CredentialResolver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this resolver owns the credential. Must not touch the store.
    fn accepts(&self, credential: &Credential<'_>) -> bool;

    async fn resolve(&self, credential: &Credential<'_>) -> Option<AuthOutcome>;
}

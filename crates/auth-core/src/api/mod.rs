//! axum integration
//!
//! Middleware that resolves the caller and stores the [`AuthOutcome`] in the
//! request extensions, the [`Caller`] extractor that reads it back, and the
//! HTTP rendering of [`AuthError`].

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use tracing::error;
use crate::auth::{AuthService, ResolveMode};
use crate::error::AuthError;
use crate::resolver::AuthOutcome;
use crate::scopes::Scope;

pub mod oidc;

pub use oidc::{oidc_router, OidcState};

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let description = if status.is_server_error() {
            error!(error = %self, "Auth request failed");
            "Internal error".to_string()
        } else {
            self.to_string()
        };

        let mut body = json!({
            "error": self.code(),
            "error_description": description,
        });
        if let AuthError::InsufficientScope { scope } = &self {
            body["scope"] = json!(scope.as_str());
        }

        let mut response = (status, Json(body)).into_response();
        if let Some(challenge) = self.www_authenticate() {
            if let Ok(value) = HeaderValue::from_str(&challenge) {
                response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
            }
        }
        response
    }
}

async fn resolve_into_extensions(
    auth: &AuthService,
    mode: ResolveMode,
    mut request: Request,
    next: Next,
) -> Response {
    match auth.resolve_caller(request.headers(), mode).await {
        Some(outcome) => {
            request.extensions_mut().insert(outcome);
            next.run(request).await
        }
        None => AuthError::Unauthenticated.into_response(),
    }
}

/// Reject unauthenticated requests; accepts bearer tokens and session cookies.
pub async fn authenticate(
    State(auth): State<Arc<AuthService>>,
    request: Request,
    next: Next,
) -> Response {
    resolve_into_extensions(&auth, ResolveMode::Any, request, next).await
}

/// Like [`authenticate`] but only honours the session cookie.
pub async fn authenticate_session_only(
    State(auth): State<Arc<AuthService>>,
    request: Request,
    next: Next,
) -> Response {
    resolve_into_extensions(&auth, ResolveMode::SessionOnly, request, next).await
}

/// The authenticated caller, placed by [`authenticate`].
#[derive(Debug, Clone)]
pub struct Caller(pub AuthOutcome);

impl Caller {
    pub fn require_scope(&self, scope: Scope) -> Result<(), AuthError> {
        self.0.require_scope(scope)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthOutcome>()
            .cloned()
            .map(Caller)
            .ok_or(AuthError::Unauthenticated)
    }
}

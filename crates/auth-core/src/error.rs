//! Error types for authentication operations

use axum::http::StatusCode;
use agora_users_core::GroupRole;
use thiserror::Error;
use crate::crypto::CryptoError;
use crate::scopes::Scope;

#[derive(Debug, Error)]
pub enum AuthError {
    /// No credential, or a credential that is invalid, expired or undecryptable.
    /// Carries no reason.
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Insufficient scope: {scope}")]
    InsufficientScope { scope: Scope },

    #[error("Insufficient role: requires {required}")]
    InsufficientRole { required: String },

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Key error: {0}")]
    Key(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(#[from] agora_users_core::Error),

    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl AuthError {
    pub fn insufficient_group_role(required: GroupRole) -> Self {
        AuthError::InsufficientRole { required: required.to_string() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientScope { .. } | AuthError::InsufficientRole { .. } => {
                StatusCode::FORBIDDEN
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable code for response bodies
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "invalid_token",
            AuthError::InsufficientScope { .. } => "insufficient_scope",
            AuthError::InsufficientRole { .. } => "insufficient_role",
            _ => "server_error",
        }
    }

    /// RFC 6750 `WWW-Authenticate` challenge, when one applies.
    pub fn www_authenticate(&self) -> Option<String> {
        match self {
            AuthError::Unauthenticated => Some("Bearer".to_string()),
            AuthError::InsufficientScope { scope } => Some(format!(
                "Bearer error=\"insufficient_scope\", scope=\"{}\"",
                scope
            )),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;

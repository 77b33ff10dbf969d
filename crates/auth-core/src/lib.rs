//! # Auth-Core - Authentication and Authorization for Agora
//!
//! Resolves the caller of a request from a personal access token, an OAuth
//! access token or a session cookie, enforces API scopes and group roles, and
//! issues RS256 OpenID Connect id_tokens.
//!
//! ```no_run
//! use std::sync::Arc;
//! use agora_auth_core::{AuthConfig, AuthService, ResolveMode, Scope};
//! use agora_users_core::MemoryStore;
//!
//! # async fn run(headers: axum::http::HeaderMap) -> agora_auth_core::Result<()> {
//! let config = AuthConfig::from_env()?;
//! let auth = AuthService::from_config(&config, Arc::new(MemoryStore::new()), None);
//!
//! let outcome = auth
//!     .resolve_caller(&headers, ResolveMode::Any)
//!     .await
//!     .ok_or(agora_auth_core::AuthError::Unauthenticated)?;
//! outcome.require_scope(Scope::ReadEvents)?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod oidc;
pub mod resolver;
pub mod scopes;

pub use auth::{
    extract_credential, require_platform_admin, require_scope, AuthService, AuthServiceBuilder,
    ResolveMode, RoleCheck,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use crate::config::{AuthConfig, Environment, OidcConfig};
pub use crypto::{generate_api_token, generate_session_id, hash_token, CryptoError, SecretCipher};
pub use error::{AuthError, Result};
pub use logging::{setup_logging, LoggingConfig};
pub use resolver::{AuthOutcome, Credential, CredentialResolver, Grant, GrantProps, TokenUnwrapper, UnwrappedToken};
pub use scopes::{expand, has_any_scope, has_scope, Scope, ScopeSet};

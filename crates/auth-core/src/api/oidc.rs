//! OpenID Provider endpoints: discovery, JWKS and userinfo

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{middleware, Json, Router};
use serde_json::Value;
use std::sync::Arc;
use super::{authenticate, Caller};
use crate::auth::AuthService;
use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::oidc::discovery::{DISCOVERY_PATH, JWKS_PATH, USERINFO_PATH};
use crate::oidc::{canonical_issuer, jwks_document, ClaimsBuilder, DiscoveryDocument, IssuerConfig, SigningKey};
use crate::scopes::Scope;

/// Shared state for [`oidc_router`]
#[derive(Clone)]
pub struct OidcState {
    pub auth: Arc<AuthService>,
    pub issuers: IssuerConfig,
    /// Published in the JWKS document
    pub signing_keys: Arc<Vec<SigningKey>>,
    pub claims: ClaimsBuilder,
}

impl OidcState {
    pub fn from_config(config: &AuthConfig, auth: Arc<AuthService>) -> Result<Self> {
        let signing_keys: Vec<SigningKey> = config.signing_key()?.into_iter().collect();
        Ok(Self {
            auth,
            issuers: config.oidc.issuer_config(),
            signing_keys: Arc::new(signing_keys),
            claims: ClaimsBuilder::new(config.oidc.profile_base_url.clone()),
        })
    }
}

/// Router serving the discovery document, the JWKS and userinfo.
pub fn oidc_router(state: OidcState) -> Router {
    let userinfo_routes = Router::new()
        .route(USERINFO_PATH, get(userinfo).post(userinfo))
        .route_layer(middleware::from_fn_with_state(Arc::clone(&state.auth), authenticate));

    Router::new()
        .route(DISCOVERY_PATH, get(discovery))
        .route(JWKS_PATH, get(jwks))
        .merge(userinfo_routes)
        .with_state(state)
}

async fn discovery(State(state): State<OidcState>, headers: HeaderMap) -> Json<DiscoveryDocument> {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let issuer = canonical_issuer(host, &state.issuers);
    Json(DiscoveryDocument::for_issuer(&issuer))
}

async fn jwks(State(state): State<OidcState>) -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "public, max-age=3600")],
        Json(jwks_document(state.signing_keys.iter())),
    )
}

async fn userinfo(State(state): State<OidcState>, Caller(outcome): Caller) -> std::result::Result<Json<Value>, AuthError> {
    outcome.require_scope(Scope::OpenId)?;
    let claims = state
        .claims
        .build(&outcome.principal, outcome.granted_scopes.as_deref(), None);
    Ok(Json(Value::Object(claims)))
}

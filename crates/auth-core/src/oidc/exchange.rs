//! id_token injection into token-endpoint responses
//!
//! The OAuth layer completes the code exchange and produces a JSON token
//! response. When the grant includes `openid` and a signing key is configured,
//! [`IdTokenAugmenter::augment`] adds an `id_token` to it. Augmentation never
//! fails the exchange: on any error the response is returned untouched.

use agora_users_core::Datastore;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use super::claims::ClaimsBuilder;
use super::keys::SigningKey;
use super::token::{issue_id_token, IdTokenOptions, DEFAULT_ID_TOKEN_TTL_SECONDS};
use crate::clock::{Clock, SystemClock};
use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::resolver::TokenUnwrapper;
use crate::scopes::split_scope_param;

const OPENID: &str = "openid";

pub struct IdTokenAugmenter {
    unwrapper: Arc<dyn TokenUnwrapper>,
    store: Arc<dyn Datastore>,
    signing_key: Option<Arc<SigningKey>>,
    claims: ClaimsBuilder,
    ttl_seconds: i64,
    clock: Arc<dyn Clock>,
}

impl IdTokenAugmenter {
    pub fn new(
        unwrapper: Arc<dyn TokenUnwrapper>,
        store: Arc<dyn Datastore>,
        signing_key: Option<Arc<SigningKey>>,
        claims: ClaimsBuilder,
    ) -> Self {
        Self {
            unwrapper,
            store,
            signing_key,
            claims,
            ttl_seconds: DEFAULT_ID_TOKEN_TTL_SECONDS,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn from_config(
        config: &AuthConfig,
        unwrapper: Arc<dyn TokenUnwrapper>,
        store: Arc<dyn Datastore>,
    ) -> Result<Self> {
        let signing_key = config.signing_key()?.map(Arc::new);
        if signing_key.is_none() {
            debug!("No signing key configured, id_tokens will not be issued");
        }
        Ok(Self::new(
            unwrapper,
            store,
            signing_key,
            ClaimsBuilder::new(config.oidc.profile_base_url.clone()),
        )
        .ttl_seconds(config.oidc.id_token_ttl_seconds))
    }

    pub fn ttl_seconds(mut self, seconds: i64) -> Self {
        self.ttl_seconds = seconds;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Add an `id_token` to a successful token response issued by `issuer`.
    pub async fn augment(&self, response: Value, issuer: &str) -> Value {
        let Some(key) = self.signing_key.as_deref() else {
            return response;
        };
        if response.get("id_token").is_some() {
            return response;
        }
        // A response that lists its scopes without openid is final.
        if let Some(scope) = response.get("scope").and_then(Value::as_str) {
            if !split_scope_param(scope).iter().any(|s| s == OPENID) {
                return response;
            }
        }

        match self.issue_for(&response, issuer, key).await {
            Ok(Some(id_token)) => {
                let mut response = response;
                if let Some(object) = response.as_object_mut() {
                    object.insert("id_token".to_string(), Value::String(id_token));
                }
                response
            }
            Ok(None) => response,
            Err(e) => {
                warn!(error = %e, "Failed to add id_token to token response");
                response
            }
        }
    }

    async fn issue_for(&self, response: &Value, issuer: &str, key: &SigningKey) -> Result<Option<String>> {
        let access_token = response
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| AuthError::Upstream("Token response has no access_token".to_string()))?;

        let grant = self
            .unwrapper
            .unwrap_token(access_token)
            .await
            .map_err(|e| AuthError::Upstream(e.to_string()))?
            .ok_or_else(|| AuthError::Upstream("Access token did not unwrap".to_string()))?
            .grant;

        let scopes = grant.effective_scopes();
        if !scopes.iter().any(|s| s == OPENID) {
            return Ok(None);
        }

        let principal = self
            .store
            .get_principal(&grant.props.user_id)
            .await?
            .ok_or_else(|| AuthError::Upstream(format!("Grant user {} not found", grant.props.user_id)))?;

        let mut options = IdTokenOptions::new(issuer, grant.props.auth_time)
            .access_token(access_token)
            .expires_in(self.ttl_seconds)
            .issued_at(self.clock.now());
        if let Some(nonce) = &grant.props.nonce {
            options = options.nonce(nonce.clone());
        }

        let id_token = issue_id_token(&principal, &grant.client_id, scopes, key, &self.claims, &options)?;
        debug!(client_id = %grant.client_id, user_id = %principal.id, "Added id_token to token response");
        Ok(Some(id_token))
    }
}

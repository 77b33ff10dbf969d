//! Personal access token resolver

use async_trait::async_trait;
use agora_users_core::Datastore;
use std::sync::Arc;
use tracing::{debug, warn};
use crate::clock::Clock;
use crate::crypto::{hash_token, API_TOKEN_PREFIX};
use super::{AuthOutcome, Credential, CredentialResolver};

/// Resolves `agp_`-prefixed bearer tokens against stored digests.
pub struct PatResolver {
    store: Arc<dyn Datastore>,
    clock: Arc<dyn Clock>,
}

impl PatResolver {
    pub fn new(store: Arc<dyn Datastore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn is_api_token(raw: &str) -> bool {
        raw.starts_with(API_TOKEN_PREFIX)
    }

    /// Record usage without holding up the request. Errors are logged only.
    fn touch_in_background(&self, token_id: String) {
        let store = Arc::clone(&self.store);
        let used_at = self.clock.now();
        tokio::spawn(async move {
            if let Err(e) = store.touch_api_token(&token_id, used_at).await {
                warn!(token_id = %token_id, error = %e, "Failed to record api token usage");
            }
        });
    }
}

#[async_trait]
impl CredentialResolver for PatResolver {
    fn name(&self) -> &'static str {
        "api_token"
    }

    fn accepts(&self, credential: &Credential<'_>) -> bool {
        matches!(credential, Credential::Bearer(raw) if Self::is_api_token(raw))
    }

    async fn resolve(&self, credential: &Credential<'_>) -> Option<AuthOutcome> {
        let Credential::Bearer(raw) = credential else {
            return None;
        };

        let digest = hash_token(raw);
        let token = match self.store.find_api_token(&digest).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("Unknown api token");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Api token lookup failed");
                return None;
            }
        };

        if token.is_expired_at(self.clock.now()) {
            debug!(token_id = %token.id, prefix = %token.token_prefix, "Expired api token");
            return None;
        }

        let principal = match self.store.get_principal(&token.owner_id).await {
            Ok(Some(principal)) => principal,
            Ok(None) => {
                warn!(token_id = %token.id, "Api token owner no longer exists");
                return None;
            }
            Err(e) => {
                warn!(token_id = %token.id, error = %e, "Api token owner lookup failed");
                return None;
            }
        };

        self.touch_in_background(token.id.clone());
        debug!(token_id = %token.id, user_id = %principal.id, "Authenticated with api token");
        Some(AuthOutcome::token(principal, token.scopes))
    }
}

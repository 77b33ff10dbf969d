//! OAuth access token resolver
//!
//! Access tokens belong to the external OAuth protocol layer and are opaque
//! here. That layer verifies and decodes them through [`TokenUnwrapper`]; this
//! resolver only reads the grant metadata it returns.

use async_trait::async_trait;
use agora_users_core::Datastore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use super::{AuthOutcome, Credential, CredentialResolver};
use crate::resolver::pat::PatResolver;

/// Metadata embedded in a grant by the authorization flow.
///
/// Only the fields read here are modelled; anything else in the blob is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantProps {
    pub user_id: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub nonce: Option<String>,
    /// Unix seconds of the user's authentication
    pub auth_time: i64,
}

/// Server-side record of an OAuth authorization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
    pub props: GrantProps,
    #[serde(default)]
    pub scope: Vec<String>,
    pub client_id: String,
}

impl Grant {
    /// Scopes the grant carries. The grant's own `scope` list wins; the copy in
    /// `props` is only used by grants that predate it.
    pub fn effective_scopes(&self) -> &[String] {
        if self.scope.is_empty() {
            &self.props.scopes
        } else {
            &self.scope
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnwrappedToken {
    pub grant: Grant,
}

/// Capability exposed by the OAuth protocol layer
#[async_trait]
pub trait TokenUnwrapper: Send + Sync {
    /// `Ok(None)` for tokens the layer does not recognise or considers expired.
    async fn unwrap_token(&self, raw_token: &str) -> anyhow::Result<Option<UnwrappedToken>>;
}

/// Resolves bearer tokens that are not personal access tokens.
pub struct OAuthResolver {
    unwrapper: Arc<dyn TokenUnwrapper>,
    store: Arc<dyn Datastore>,
}

impl OAuthResolver {
    pub fn new(unwrapper: Arc<dyn TokenUnwrapper>, store: Arc<dyn Datastore>) -> Self {
        Self { unwrapper, store }
    }
}

#[async_trait]
impl CredentialResolver for OAuthResolver {
    fn name(&self) -> &'static str {
        "oauth"
    }

    fn accepts(&self, credential: &Credential<'_>) -> bool {
        matches!(credential, Credential::Bearer(raw) if !PatResolver::is_api_token(raw))
    }

    async fn resolve(&self, credential: &Credential<'_>) -> Option<AuthOutcome> {
        let Credential::Bearer(raw) = credential else {
            return None;
        };

        let grant = match self.unwrapper.unwrap_token(raw).await {
            Ok(Some(unwrapped)) => unwrapped.grant,
            Ok(None) => {
                debug!("OAuth token not recognised");
                return None;
            }
            Err(e) => {
                debug!(error = %e, "OAuth token failed to unwrap");
                return None;
            }
        };

        let principal = match self.store.get_principal(&grant.props.user_id).await {
            Ok(Some(principal)) => principal,
            Ok(None) => {
                warn!(client_id = %grant.client_id, "OAuth grant refers to a missing user");
                return None;
            }
            Err(e) => {
                warn!(client_id = %grant.client_id, error = %e, "OAuth grant user lookup failed");
                return None;
            }
        };

        debug!(client_id = %grant.client_id, user_id = %principal.id, "Authenticated with oauth token");
        let scopes = grant.effective_scopes().to_vec();
        Some(AuthOutcome::token(principal, scopes))
    }
}

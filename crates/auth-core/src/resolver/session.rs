//! Browser session resolver

use async_trait::async_trait;
use agora_users_core::Datastore;
use std::sync::Arc;
use tracing::{debug, warn};
use crate::clock::Clock;
use super::{AuthOutcome, Credential, CredentialResolver};

/// Extract the value of `cookie_name` from a `Cookie` header.
///
/// Linear scan: split on `;`, then on the first `=`. Empty values and
/// surrounding double quotes are treated as absent/stripped.
pub fn session_id_from_cookie_header<'a>(header: &'a str, cookie_name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| name.trim() == cookie_name)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
}

/// Resolves the environment's session cookie to its owner.
pub struct SessionResolver {
    store: Arc<dyn Datastore>,
    clock: Arc<dyn Clock>,
    cookie_name: String,
}

impl SessionResolver {
    pub fn new(store: Arc<dyn Datastore>, clock: Arc<dyn Clock>, cookie_name: impl Into<String>) -> Self {
        Self {
            store,
            clock,
            cookie_name: cookie_name.into(),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }
}

#[async_trait]
impl CredentialResolver for SessionResolver {
    fn name(&self) -> &'static str {
        "session"
    }

    fn accepts(&self, credential: &Credential<'_>) -> bool {
        matches!(credential, Credential::Cookie(_))
    }

    async fn resolve(&self, credential: &Credential<'_>) -> Option<AuthOutcome> {
        let Credential::Cookie(header) = credential else {
            return None;
        };
        let session_id = session_id_from_cookie_header(header, &self.cookie_name)?;

        match self.store.find_active_session(session_id, self.clock.now()).await {
            Ok(Some((session, principal))) => {
                debug!(user_id = %principal.id, expires_at = %session.expires_at, "Authenticated with session");
                Some(AuthOutcome::session(principal))
            }
            Ok(None) => {
                debug!("Session missing or expired");
                None
            }
            Err(e) => {
                warn!(error = %e, "Session lookup failed");
                None
            }
        }
    }
}

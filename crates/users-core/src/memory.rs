//! In-memory datastore

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;
use crate::{
    ApiToken, ApiTokenStore, Error, GroupMembership, MembershipStore, Principal, Result,
    Session, SessionStore, UserStore,
};

/// In-memory store backing every datastore trait.
///
/// Cloning shares the underlying maps.
#[derive(Clone, Default)]
pub struct MemoryStore {
    /// Map of user_id to principal
    users: Arc<DashMap<String, Principal>>,
    /// Map of token digest to token record
    api_tokens: Arc<DashMap<String, ApiToken>>,
    /// Map of session id to session record
    sessions: Arc<DashMap<String, Session>>,
    /// Map of (group_id, user_id) to membership
    memberships: Arc<DashMap<(String, String), GroupMembership>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_principal(&self, principal: Principal) {
        self.users.insert(principal.id.clone(), principal);
    }

    /// Store a token record. Digests are unique.
    pub fn insert_api_token(&self, token: ApiToken) -> Result<()> {
        if self.api_tokens.contains_key(&token.token_hash) {
            return Err(Error::AlreadyExists(format!("api token {}", token.id)));
        }
        self.api_tokens.insert(token.token_hash.clone(), token);
        Ok(())
    }

    pub fn insert_session(&self, session: Session) {
        self.sessions.insert(session.id.clone(), session);
    }

    pub fn remove_session(&self, session_id: &str) -> Option<Session> {
        self.sessions.remove(session_id).map(|(_, session)| session)
    }

    pub fn insert_membership(&self, membership: GroupMembership) {
        self.memberships.insert(
            (membership.group_id.clone(), membership.user_id.clone()),
            membership,
        );
    }

    /// Fetch a token record by id
    pub fn api_token(&self, token_id: &str) -> Option<ApiToken> {
        self.api_tokens
            .iter()
            .find(|entry| entry.value().id == token_id)
            .map(|entry| entry.value().clone())
    }

    /// Change the expiry of an existing token
    pub fn set_api_token_expiry(&self, token_id: &str, expires_at: Option<DateTime<Utc>>) -> Result<()> {
        let mut entry = self
            .api_tokens
            .iter_mut()
            .find(|entry| entry.value().id == token_id)
            .ok_or_else(|| Error::NotFound(format!("api token {}", token_id)))?;
        entry.value_mut().expires_at = expires_at;
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_principal(&self, user_id: &str) -> Result<Option<Principal>> {
        Ok(self.users.get(user_id).map(|entry| entry.clone()))
    }
}

#[async_trait]
impl ApiTokenStore for MemoryStore {
    async fn find_api_token(&self, token_hash: &str) -> Result<Option<ApiToken>> {
        Ok(self.api_tokens.get(token_hash).map(|entry| entry.clone()))
    }

    async fn touch_api_token(&self, token_id: &str, used_at: DateTime<Utc>) -> Result<()> {
        let mut entry = self
            .api_tokens
            .iter_mut()
            .find(|entry| entry.value().id == token_id)
            .ok_or_else(|| Error::NotFound(format!("api token {}", token_id)))?;
        entry.value_mut().last_used_at = Some(used_at);
        debug!(token_id = %token_id, "api token usage recorded");
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn find_active_session(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<(Session, Principal)>> {
        let session = match self.sessions.get(session_id) {
            Some(entry) if entry.is_active_at(now) => entry.clone(),
            _ => return Ok(None),
        };
        Ok(self
            .users
            .get(&session.owner_id)
            .map(|owner| (session, owner.clone())))
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn get_membership(&self, group_id: &str, user_id: &str) -> Result<Option<GroupMembership>> {
        Ok(self
            .memberships
            .get(&(group_id.to_string(), user_id.to_string()))
            .map(|entry| entry.clone()))
    }
}

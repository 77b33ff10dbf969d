//! Shared fixtures for auth-core integration tests

#![allow(dead_code)]

use agora_auth_core::crypto::generate_api_token;
use agora_auth_core::oidc::SigningKey;
use agora_auth_core::resolver::{Grant, GrantProps, TokenUnwrapper, UnwrappedToken};
use agora_users_core::{
    ApiToken, ApiTokenStore, Error, GroupMembership, GroupRole, MembershipStore, MemoryStore,
    PlatformRole, Principal, Session, SessionStore, UserStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

pub const SIGNING_JWK: &str = include_str!("../fixtures/signing_key.jwk.json");
pub const OTHER_JWK: &str = include_str!("../fixtures/other_key.jwk.json");

/// Unwrapping this token fails outright
pub const BROKEN_OAUTH_TOKEN: &str = "oauth-broken";

pub fn signing_key() -> SigningKey {
    SigningKey::from_jwk_json(SIGNING_JWK).unwrap()
}

pub fn other_key() -> SigningKey {
    SigningKey::from_jwk_json(OTHER_JWK).unwrap()
}

pub fn principal(id: &str, username: &str, role: PlatformRole) -> Principal {
    Principal {
        id: id.to_string(),
        username: username.to_string(),
        display_name: Some(format!("{} (display)", username)),
        avatar_url: Some(format!("https://cdn.example/{}.png", username)),
        email: Some(format!("{}@example.com", username)),
        role,
        updated_at: Utc::now(),
    }
}

/// Issue a PAT for `owner_id` and store its record; returns the raw token.
pub fn issue_pat(
    store: &MemoryStore,
    token_id: &str,
    owner_id: &str,
    scopes: &[&str],
    expires_at: Option<DateTime<Utc>>,
) -> String {
    let generated = generate_api_token();
    store
        .insert_api_token(ApiToken {
            id: token_id.to_string(),
            owner_id: owner_id.to_string(),
            token_hash: generated.digest.clone(),
            token_prefix: generated.display_prefix.clone(),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            expires_at,
            last_used_at: None,
            created_at: Utc::now(),
        })
        .unwrap();
    generated.raw
}

pub fn session(id: &str, owner_id: &str, expires_at: DateTime<Utc>) -> Session {
    Session {
        id: id.to_string(),
        owner_id: owner_id.to_string(),
        expires_at,
        created_at: expires_at - chrono::Duration::days(30),
    }
}

pub fn membership(group_id: &str, user_id: &str, role: GroupRole) -> GroupMembership {
    GroupMembership {
        group_id: group_id.to_string(),
        user_id: user_id.to_string(),
        role,
        joined_at: Utc::now(),
    }
}

pub fn grant(user_id: &str, client_id: &str, scope: &[&str], nonce: Option<&str>) -> Grant {
    Grant {
        props: GrantProps {
            user_id: user_id.to_string(),
            scopes: vec![],
            nonce: nonce.map(str::to_string),
            auth_time: 1_700_000_000,
        },
        scope: scope.iter().map(|s| s.to_string()).collect(),
        client_id: client_id.to_string(),
    }
}

/// Stand-in for the OAuth protocol layer
#[derive(Default)]
pub struct FakeUnwrapper {
    grants: Mutex<HashMap<String, Grant>>,
}

impl FakeUnwrapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, access_token: &str, grant: Grant) {
        self.grants.lock().insert(access_token.to_string(), grant);
    }
}

#[async_trait]
impl TokenUnwrapper for FakeUnwrapper {
    async fn unwrap_token(&self, raw_token: &str) -> anyhow::Result<Option<UnwrappedToken>> {
        if raw_token == BROKEN_OAUTH_TOKEN {
            anyhow::bail!("token decryption failed");
        }
        Ok(self
            .grants
            .lock()
            .get(raw_token)
            .cloned()
            .map(|grant| UnwrappedToken { grant }))
    }
}

/// Memory store whose usage writes always fail
#[derive(Clone, Default)]
pub struct FailingTouchStore {
    pub inner: MemoryStore,
}

#[async_trait]
impl UserStore for FailingTouchStore {
    async fn get_principal(&self, user_id: &str) -> agora_users_core::Result<Option<Principal>> {
        self.inner.get_principal(user_id).await
    }
}

#[async_trait]
impl ApiTokenStore for FailingTouchStore {
    async fn find_api_token(&self, token_hash: &str) -> agora_users_core::Result<Option<ApiToken>> {
        self.inner.find_api_token(token_hash).await
    }

    async fn touch_api_token(&self, _token_id: &str, _used_at: DateTime<Utc>) -> agora_users_core::Result<()> {
        Err(Error::Database("connection reset".to_string()))
    }
}

#[async_trait]
impl SessionStore for FailingTouchStore {
    async fn find_active_session(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> agora_users_core::Result<Option<(Session, Principal)>> {
        self.inner.find_active_session(session_id, now).await
    }
}

#[async_trait]
impl MembershipStore for FailingTouchStore {
    async fn get_membership(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> agora_users_core::Result<Option<GroupMembership>> {
        self.inner.get_membership(group_id, user_id).await
    }
}

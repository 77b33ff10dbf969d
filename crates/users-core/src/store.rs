//! Datastore interface
//!
//! Every method is a single statement against the backing store. Callers rely
//! on per-statement atomicity only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::{ApiTokenStore, GroupMembership, Principal, Result, Session};

/// User lookup
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_principal(&self, user_id: &str) -> Result<Option<Principal>>;
}

/// Session lookup
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Combined session + owner lookup keyed on `(session_id, expires_at > now)`.
    async fn find_active_session(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<(Session, Principal)>>;
}

/// Group membership lookup
#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn get_membership(&self, group_id: &str, user_id: &str) -> Result<Option<GroupMembership>>;
}

/// Everything the auth layer reads
pub trait Datastore: UserStore + ApiTokenStore + SessionStore + MembershipStore {}

impl<T> Datastore for T where T: UserStore + ApiTokenStore + SessionStore + MembershipStore {}

//! Personal access token records

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::Result;

/// Personal access token.
///
/// Only the one-way digest of the raw secret is stored. A lost raw token
/// cannot be recovered, only replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiToken {
    pub id: String,
    pub owner_id: String,
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// Leading characters of the raw token, for display only
    pub token_prefix: String,
    pub scopes: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ApiToken {
    /// Tokens without an expiry never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// API token storage trait
#[async_trait]
pub trait ApiTokenStore: Send + Sync {
    /// Point lookup by digest. Never called with a raw secret.
    async fn find_api_token(&self, token_hash: &str) -> Result<Option<ApiToken>>;

    /// Best-effort usage timestamp update.
    async fn touch_api_token(&self, token_id: &str, used_at: DateTime<Utc>) -> Result<()>;
}

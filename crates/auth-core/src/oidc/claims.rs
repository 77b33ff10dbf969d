//! OIDC claims construction
//!
//! The visibility predicates here are the only place that decides whether a
//! caller may see profile or email data. The claims builder and the direct
//! API representation ([`ProfileView`]) both go through them.

use agora_users_core::Principal;
use serde::Serialize;
use serde_json::{Map, Value};
use crate::scopes::{has_scope, Scope};

/// Namespaced claim carrying the user's entitlements
pub const ENTITLEMENTS_CLAIM: &str = "https://agora.community/claims/entitlements";

/// Sessions, or tokens holding `read:user` (implied by `user` and `admin`).
pub fn can_view_profile(granted: Option<&[String]>) -> bool {
    granted.is_none_or(|scopes| has_scope(scopes, Scope::ReadUser))
}

/// Sessions, or tokens holding `read:email` (implied by `user` and `admin`).
pub fn can_view_email(granted: Option<&[String]>) -> bool {
    granted.is_none_or(|scopes| has_scope(scopes, Scope::ReadEmail))
}

/// Builds standard-shaped claim sets from a principal and its scopes
#[derive(Debug, Clone)]
pub struct ClaimsBuilder {
    profile_base_url: String,
}

impl ClaimsBuilder {
    pub fn new(profile_base_url: impl Into<String>) -> Self {
        Self {
            profile_base_url: profile_base_url.into(),
        }
    }

    pub fn profile_url(&self, principal: &Principal) -> String {
        format!("{}/{}", self.profile_base_url.trim_end_matches('/'), principal.username)
    }

    /// `sub` always; profile, email and entitlement claims only when the
    /// scopes allow them.
    ///
    /// `email_verified` is always `true`: every account comes from an upstream
    /// identity provider that has verified the address. Revisit if accounts
    /// can ever be created without one.
    pub fn build(
        &self,
        principal: &Principal,
        granted: Option<&[String]>,
        entitlements: Option<&[String]>,
    ) -> Map<String, Value> {
        let mut claims = Map::new();
        claims.insert("sub".to_string(), Value::from(principal.id.clone()));

        let profile = can_view_profile(granted);
        if profile {
            let name = principal
                .display_name
                .clone()
                .unwrap_or_else(|| principal.username.clone());
            claims.insert("name".to_string(), Value::from(name));
            claims.insert(
                "preferred_username".to_string(),
                Value::from(principal.username.clone()),
            );
            if let Some(avatar) = &principal.avatar_url {
                claims.insert("picture".to_string(), Value::from(avatar.clone()));
            }
            claims.insert("profile".to_string(), Value::from(self.profile_url(principal)));
            claims.insert(
                "updated_at".to_string(),
                Value::from(principal.updated_at.timestamp()),
            );
        }

        if can_view_email(granted) {
            if let Some(email) = &principal.email {
                claims.insert("email".to_string(), Value::from(email.clone()));
                claims.insert("email_verified".to_string(), Value::Bool(true));
            }
        }

        if let (true, Some(entitlements)) = (profile, entitlements) {
            claims.insert(ENTITLEMENTS_CLAIM.to_string(), Value::from(entitlements.to_vec()));
        }

        claims
    }
}

/// User representation returned by direct API calls
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileView {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ProfileView {
    pub fn from_principal(principal: &Principal, granted: Option<&[String]>) -> Self {
        let profile = can_view_profile(granted);
        Self {
            id: principal.id.clone(),
            username: Some(principal.username.clone()).filter(|_| profile),
            display_name: principal.display_name.clone().filter(|_| profile),
            avatar_url: principal.avatar_url.clone().filter(|_| profile),
            email: principal.email.clone().filter(|_| can_view_email(granted)),
        }
    }
}

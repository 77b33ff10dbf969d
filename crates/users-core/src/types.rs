//! Core types for users-core

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform-wide role of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformRole {
    #[default]
    User,
    Admin,
    Superadmin,
}

impl PlatformRole {
    /// Admins and superadmins bypass group-level role checks.
    pub fn is_platform_admin(self) -> bool {
        matches!(self, PlatformRole::Admin | PlatformRole::Superadmin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlatformRole::User => "user",
            PlatformRole::Admin => "admin",
            PlatformRole::Superadmin => "superadmin",
        }
    }
}

impl fmt::Display for PlatformRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The resolved identity of a caller.
///
/// Owned by the user store and read-only from the auth layer's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    pub role: PlatformRole,
    pub updated_at: DateTime<Utc>,
}

impl Principal {
    pub fn is_platform_admin(&self) -> bool {
        self.role.is_platform_admin()
    }
}

/// Browser session.
///
/// The id is the bearer credential carried in the session cookie, so it must
/// be generated from a CSPRNG with at least 128 bits of entropy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(skip_serializing)]
    pub id: String,
    pub owner_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// A session is live strictly before its expiry instant.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Role inside a single group. Declaration order is the hierarchy, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupRole {
    Member,
    Volunteer,
    Manager,
    Owner,
}

impl GroupRole {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupRole::Member => "member",
            GroupRole::Volunteer => "volunteer",
            GroupRole::Manager => "manager",
            GroupRole::Owner => "owner",
        }
    }

    /// `true` if this role sits at or above `min` in the hierarchy.
    pub fn satisfies(self, min: GroupRole) -> bool {
        self >= min
    }
}

impl fmt::Display for GroupRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "member" => Ok(GroupRole::Member),
            "volunteer" => Ok(GroupRole::Volunteer),
            "manager" => Ok(GroupRole::Manager),
            "owner" => Ok(GroupRole::Owner),
            other => Err(format!("unknown group role: {}", other)),
        }
    }
}

/// Membership of a user in a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group_id: String,
    pub user_id: String,
    pub role: GroupRole,
    pub joined_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_group_role_hierarchy() {
        assert!(GroupRole::Owner.satisfies(GroupRole::Manager));
        assert!(GroupRole::Manager.satisfies(GroupRole::Manager));
        assert!(GroupRole::Volunteer.satisfies(GroupRole::Member));
        assert!(!GroupRole::Member.satisfies(GroupRole::Volunteer));
        assert!(!GroupRole::Manager.satisfies(GroupRole::Owner));
    }

    #[test]
    fn test_group_role_parse() {
        assert_eq!("owner".parse::<GroupRole>().unwrap(), GroupRole::Owner);
        assert_eq!("volunteer".parse::<GroupRole>().unwrap(), GroupRole::Volunteer);
        assert!("founder".parse::<GroupRole>().is_err());
    }

    #[test]
    fn test_platform_admin_roles() {
        assert!(!PlatformRole::User.is_platform_admin());
        assert!(PlatformRole::Admin.is_platform_admin());
        assert!(PlatformRole::Superadmin.is_platform_admin());
    }

    #[test]
    fn test_session_expiry_boundary() {
        let now = Utc::now();
        let session = Session {
            id: "s".to_string(),
            owner_id: "u".to_string(),
            expires_at: now,
            created_at: now - Duration::hours(1),
        };

        assert!(session.is_active_at(now - Duration::milliseconds(1)));
        assert!(!session.is_active_at(now));
    }
}

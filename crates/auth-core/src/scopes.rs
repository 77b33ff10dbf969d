//! Scope registry
//!
//! A fixed table of API scopes, the implication graph between them and the
//! legacy names clients may still send. The table is immutable and needs no
//! synchronization.
//!
//! Parsing is permissive and checking is strict: unknown scope strings are
//! dropped silently and can never satisfy a check.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A registered API scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    Admin,
    OpenId,
    OfflineAccess,
    User,
    ReadUser,
    WriteUser,
    ReadEmail,
    Events,
    ReadEvents,
    WriteEvents,
    Rsvps,
    ReadRsvps,
    WriteRsvps,
    Groups,
    ReadGroups,
    WriteGroups,
    Badges,
    ReadBadges,
    WriteBadges,
}

/// Set of canonical scopes
pub type ScopeSet = BTreeSet<Scope>;

impl Scope {
    /// Every registered scope. `Admin` must stay first.
    pub const ALL: &'static [Scope] = &[
        Scope::Admin,
        Scope::OpenId,
        Scope::OfflineAccess,
        Scope::User,
        Scope::ReadUser,
        Scope::WriteUser,
        Scope::ReadEmail,
        Scope::Events,
        Scope::ReadEvents,
        Scope::WriteEvents,
        Scope::Rsvps,
        Scope::ReadRsvps,
        Scope::WriteRsvps,
        Scope::Groups,
        Scope::ReadGroups,
        Scope::WriteGroups,
        Scope::Badges,
        Scope::ReadBadges,
        Scope::WriteBadges,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Admin => "admin",
            Scope::OpenId => "openid",
            Scope::OfflineAccess => "offline_access",
            Scope::User => "user",
            Scope::ReadUser => "read:user",
            Scope::WriteUser => "write:user",
            Scope::ReadEmail => "read:email",
            Scope::Events => "events",
            Scope::ReadEvents => "read:events",
            Scope::WriteEvents => "write:events",
            Scope::Rsvps => "rsvps",
            Scope::ReadRsvps => "read:rsvps",
            Scope::WriteRsvps => "write:rsvps",
            Scope::Groups => "groups",
            Scope::ReadGroups => "read:groups",
            Scope::WriteGroups => "write:groups",
            Scope::Badges => "badges",
            Scope::ReadBadges => "read:badges",
            Scope::WriteBadges => "write:badges",
        }
    }

    /// Human-readable text for consent screens
    pub fn description(self) -> &'static str {
        match self {
            Scope::Admin => "Full administrative access to the platform",
            Scope::OpenId => "Sign you in with your Agora account",
            Scope::OfflineAccess => "Stay signed in when you are not using the app",
            Scope::User => "Read and update your profile and email address",
            Scope::ReadUser => "Read your public profile",
            Scope::WriteUser => "Update your profile",
            Scope::ReadEmail => "Read your email address",
            Scope::Events => "Read and manage events",
            Scope::ReadEvents => "Read events",
            Scope::WriteEvents => "Create and update events",
            Scope::Rsvps => "Read and manage your RSVPs",
            Scope::ReadRsvps => "Read your RSVPs",
            Scope::WriteRsvps => "RSVP to events on your behalf",
            Scope::Groups => "Read and manage groups",
            Scope::ReadGroups => "Read groups and memberships",
            Scope::WriteGroups => "Create and update groups",
            Scope::Badges => "Read and award badges",
            Scope::ReadBadges => "Read badges",
            Scope::WriteBadges => "Award and revoke badges",
        }
    }

    /// Scopes directly implied by this one. The graph is acyclic.
    pub fn implies(self) -> &'static [Scope] {
        match self {
            Scope::Admin => &Scope::ALL[1..],
            Scope::User => &[Scope::ReadUser, Scope::WriteUser, Scope::ReadEmail],
            Scope::WriteUser => &[Scope::ReadUser],
            Scope::Events => &[Scope::ReadEvents, Scope::WriteEvents],
            Scope::WriteEvents => &[Scope::ReadEvents],
            Scope::Rsvps => &[Scope::ReadRsvps, Scope::WriteRsvps],
            Scope::WriteRsvps => &[Scope::ReadRsvps],
            Scope::Groups => &[Scope::ReadGroups, Scope::WriteGroups],
            Scope::WriteGroups => &[Scope::ReadGroups],
            Scope::Badges => &[Scope::ReadBadges, Scope::WriteBadges],
            Scope::WriteBadges => &[Scope::ReadBadges],
            _ => &[],
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    /// Canonical names only; see [`resolve_alias`] for legacy names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scope::ALL
            .iter()
            .copied()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| format!("unknown scope: {}", s))
    }
}

/// Pre-rename scope names, each mapping onto exactly one current scope
const LEGACY_ALIASES: &[(&str, Scope)] = &[
    ("profile", Scope::ReadUser),
    ("email", Scope::ReadEmail),
    ("user:email", Scope::ReadEmail),
    ("events:read", Scope::ReadEvents),
    ("events:write", Scope::WriteEvents),
    ("rsvps:read", Scope::ReadRsvps),
    ("rsvps:write", Scope::WriteRsvps),
    ("groups:read", Scope::ReadGroups),
    ("groups:write", Scope::WriteGroups),
    ("badges:read", Scope::ReadBadges),
    ("badges:write", Scope::WriteBadges),
];

/// Resolve a raw scope string, legacy or current, to its canonical scope.
pub fn resolve_alias(raw: &str) -> Option<Scope> {
    let raw = raw.trim();
    LEGACY_ALIASES
        .iter()
        .find(|(legacy, _)| *legacy == raw)
        .map(|(_, scope)| *scope)
        .or_else(|| raw.parse().ok())
}

/// Expand raw scope strings into the full set of scopes they grant.
///
/// Aliases are resolved first, then every implied scope is added
/// transitively. Idempotent and order-independent.
pub fn expand<I, S>(raw: I) -> ScopeSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut expanded = ScopeSet::new();
    let mut pending: Vec<Scope> = raw
        .into_iter()
        .filter_map(|s| resolve_alias(s.as_ref()))
        .collect();

    while let Some(scope) = pending.pop() {
        if expanded.insert(scope) {
            pending.extend_from_slice(scope.implies());
        }
    }
    expanded
}

/// `true` iff `required` (or `admin`) is in the expansion of `granted`.
pub fn has_scope<S: AsRef<str>>(granted: &[S], required: Scope) -> bool {
    let expanded = expand(granted);
    expanded.contains(&required) || expanded.contains(&Scope::Admin)
}

/// `true` if any of `required` is granted
pub fn has_any_scope<S: AsRef<str>>(granted: &[S], required: &[Scope]) -> bool {
    required.iter().any(|scope| has_scope(granted, *scope))
}

/// Canonical names of the recognised scopes in `raw`, unknown names dropped.
///
/// Not expanded: used to echo back what was requested.
pub fn normalize<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let canonical: ScopeSet = raw.iter().filter_map(|s| resolve_alias(s.as_ref())).collect();
    canonical.into_iter().map(|s| s.as_str().to_string()).collect()
}

/// Split an OAuth space-delimited `scope` parameter.
pub fn split_scope_param(param: &str) -> Vec<String> {
    param.split_whitespace().map(str::to_string).collect()
}

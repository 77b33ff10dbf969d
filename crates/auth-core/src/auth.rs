//! Authentication façade
//!
//! Picks the credential out of a request, runs the resolver chain and exposes
//! the scope and role guards endpoint handlers call before doing any work.

use axum::http::{header, HeaderMap};
use agora_users_core::{Datastore, GroupMembership, GroupRole, Principal};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::debug;
use crate::clock::{Clock, SystemClock};
use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::resolver::{
    AuthOutcome, Credential, CredentialResolver, OAuthResolver, PatResolver, SessionResolver,
    TokenUnwrapper,
};
use crate::scopes::{has_scope, Scope};

/// Which credentials a route accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolveMode {
    /// Bearer tokens first, session cookie as fallback
    #[default]
    Any,
    /// First-party web routes: bearer headers are ignored entirely
    SessionOnly,
}

/// Outcome of a group role check
#[derive(Debug, Clone, PartialEq)]
pub struct RoleCheck {
    /// The caller's real membership, if any. Never synthesised for admins.
    pub membership: Option<GroupMembership>,
    pub satisfied: bool,
}

impl RoleCheck {
    /// Turn an unsatisfied check into `InsufficientRole`.
    pub fn require(self, min_role: GroupRole) -> Result<Option<GroupMembership>> {
        if self.satisfied {
            Ok(self.membership)
        } else {
            Err(AuthError::insufficient_group_role(min_role))
        }
    }
}

/// Entry point for resolving and authorizing callers
pub struct AuthService {
    resolvers: Vec<Arc<dyn CredentialResolver>>,
    store: Arc<dyn Datastore>,
}

impl AuthService {
    pub fn builder(store: Arc<dyn Datastore>) -> AuthServiceBuilder {
        AuthServiceBuilder {
            store,
            clock: Arc::new(SystemClock),
            cookie_name: crate::config::Environment::default().session_cookie_name().to_string(),
            unwrapper: None,
        }
    }

    /// Wire the service from configuration
    pub fn from_config(
        config: &AuthConfig,
        store: Arc<dyn Datastore>,
        unwrapper: Option<Arc<dyn TokenUnwrapper>>,
    ) -> Self {
        let mut builder = Self::builder(store).session_cookie_name(config.session_cookie_name());
        if let Some(unwrapper) = unwrapper {
            builder = builder.token_unwrapper(unwrapper);
        }
        builder.build()
    }

    /// Names of the resolvers in chain order
    pub fn resolver_names(&self) -> Vec<&'static str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    /// Resolve the caller of a request, or `None` if unauthenticated.
    pub async fn resolve_caller(&self, headers: &HeaderMap, mode: ResolveMode) -> Option<AuthOutcome> {
        let credential = extract_credential(headers, mode)?;
        self.resolve_credential(&credential).await
    }

    /// Hand the credential to the first resolver that accepts it.
    pub async fn resolve_credential(&self, credential: &Credential<'_>) -> Option<AuthOutcome> {
        let resolver = self.resolvers.iter().find(|r| r.accepts(credential))?;
        let outcome = resolver.resolve(credential).await;
        debug!(
            resolver = resolver.name(),
            authenticated = outcome.is_some(),
            "Resolved caller"
        );
        outcome
    }

    /// Check the principal's role in a group.
    ///
    /// Platform admins always satisfy the check, but the returned membership
    /// is whatever the store holds.
    pub async fn require_group_role(
        &self,
        principal: &Principal,
        group_id: &str,
        min_role: GroupRole,
    ) -> Result<RoleCheck> {
        let membership = self.store.get_membership(group_id, &principal.id).await?;
        let satisfied = principal.is_platform_admin()
            || membership
                .as_ref()
                .is_some_and(|m| m.role.satisfies(min_role));

        debug!(
            user_id = %principal.id,
            group_id = %group_id,
            min_role = %min_role,
            satisfied,
            "Group role check"
        );
        Ok(RoleCheck { membership, satisfied })
    }
}

/// Builder for [`AuthService`]
pub struct AuthServiceBuilder {
    store: Arc<dyn Datastore>,
    clock: Arc<dyn Clock>,
    cookie_name: String,
    unwrapper: Option<Arc<dyn TokenUnwrapper>>,
}

impl AuthServiceBuilder {
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn session_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Enable OAuth bearer tokens
    pub fn token_unwrapper(mut self, unwrapper: Arc<dyn TokenUnwrapper>) -> Self {
        self.unwrapper = Some(unwrapper);
        self
    }

    pub fn build(self) -> AuthService {
        let mut resolvers: Vec<Arc<dyn CredentialResolver>> = vec![Arc::new(PatResolver::new(
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
        ))];
        if let Some(unwrapper) = self.unwrapper {
            resolvers.push(Arc::new(OAuthResolver::new(unwrapper, Arc::clone(&self.store))));
        }
        resolvers.push(Arc::new(SessionResolver::new(
            Arc::clone(&self.store),
            self.clock,
            self.cookie_name,
        )));

        AuthService {
            resolvers,
            store: self.store,
        }
    }
}

/// Pick the credential a request carries.
///
/// A `Bearer` authorization header wins unless the mode is session-only;
/// otherwise the `Cookie` header is used.
pub fn extract_credential(headers: &HeaderMap, mode: ResolveMode) -> Option<Credential<'_>> {
    if mode == ResolveMode::Any {
        if let Some(token) = bearer_token(headers) {
            return Some(Credential::Bearer(token));
        }
    }
    cookie_header(headers).map(Credential::Cookie)
}

/// All `Cookie` headers as one. HTTP/2 clients may send one header per cookie.
fn cookie_header(headers: &HeaderMap) -> Option<Cow<'_, str>> {
    let mut values = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok());
    let first = values.next()?;
    let rest: Vec<&str> = values.collect();
    if rest.is_empty() {
        return Some(Cow::Borrowed(first));
    }
    let mut joined = first.to_string();
    for value in rest {
        joined.push_str("; ");
        joined.push_str(value);
    }
    Some(Cow::Owned(joined))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Allow iff the outcome carries `scope`.
///
/// Sessions always pass: first-party principals are gated by role checks
/// rather than API scopes.
pub fn require_scope(outcome: &AuthOutcome, scope: Scope) -> Result<()> {
    match &outcome.granted_scopes {
        None => Ok(()),
        Some(granted) if has_scope(granted, scope) => Ok(()),
        Some(_) => Err(AuthError::InsufficientScope { scope }),
    }
}

/// Allow only platform admins
pub fn require_platform_admin(principal: &Principal) -> Result<()> {
    if principal.is_platform_admin() {
        Ok(())
    } else {
        Err(AuthError::InsufficientRole { required: "admin".to_string() })
    }
}

impl AuthOutcome {
    pub fn require_scope(&self, scope: Scope) -> Result<()> {
        require_scope(self, scope)
    }
}

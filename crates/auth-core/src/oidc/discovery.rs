//! OpenID Provider metadata

use serde::Serialize;
use super::claims::ENTITLEMENTS_CLAIM;
use super::keys::RS256;
use crate::scopes::Scope;

pub const AUTHORIZATION_PATH: &str = "/oauth/authorize";
pub const TOKEN_PATH: &str = "/oauth/token";
pub const USERINFO_PATH: &str = "/oauth/userinfo";
pub const JWKS_PATH: &str = "/.well-known/jwks.json";
pub const DISCOVERY_PATH: &str = "/.well-known/openid-configuration";

/// `/.well-known/openid-configuration` document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryDocument {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
    pub jwks_uri: String,
    pub response_types_supported: Vec<&'static str>,
    pub grant_types_supported: Vec<&'static str>,
    pub subject_types_supported: Vec<&'static str>,
    pub id_token_signing_alg_values_supported: Vec<&'static str>,
    pub token_endpoint_auth_methods_supported: Vec<&'static str>,
    pub code_challenge_methods_supported: Vec<&'static str>,
    pub scopes_supported: Vec<&'static str>,
    pub claims_supported: Vec<&'static str>,
}

impl DiscoveryDocument {
    /// Metadata for `issuer`, which should come from
    /// [`canonical_issuer`](super::issuer::canonical_issuer) so it matches the
    /// `iss` of issued tokens.
    pub fn for_issuer(issuer: &str) -> Self {
        let base = issuer.trim_end_matches('/');
        Self {
            issuer: issuer.to_string(),
            authorization_endpoint: format!("{}{}", base, AUTHORIZATION_PATH),
            token_endpoint: format!("{}{}", base, TOKEN_PATH),
            userinfo_endpoint: format!("{}{}", base, USERINFO_PATH),
            jwks_uri: format!("{}{}", base, JWKS_PATH),
            response_types_supported: vec!["code"],
            grant_types_supported: vec!["authorization_code", "refresh_token"],
            subject_types_supported: vec!["public"],
            id_token_signing_alg_values_supported: vec![RS256],
            token_endpoint_auth_methods_supported: vec!["client_secret_basic", "client_secret_post", "none"],
            code_challenge_methods_supported: vec!["S256"],
            scopes_supported: Scope::ALL.iter().map(|s| s.as_str()).collect(),
            claims_supported: vec![
                "iss",
                "sub",
                "aud",
                "exp",
                "iat",
                "auth_time",
                "nonce",
                "at_hash",
                "name",
                "preferred_username",
                "picture",
                "profile",
                "updated_at",
                "email",
                "email_verified",
                ENTITLEMENTS_CLAIM,
            ],
        }
    }
}

//! RS256 id_token issuance and verification

use agora_users_core::Principal;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, decode_header, encode, Algorithm, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::debug;
use super::claims::ClaimsBuilder;
use super::keys::{SigningKey, VerificationKey};
use crate::error::{AuthError, Result};

pub const DEFAULT_ID_TOKEN_TTL_SECONDS: i64 = 3600;

/// Per-token issuance parameters
#[derive(Debug, Clone)]
pub struct IdTokenOptions {
    issuer: String,
    auth_time: i64,
    nonce: Option<String>,
    access_token: Option<String>,
    entitlements: Option<Vec<String>>,
    expires_in: i64,
    issued_at: Option<DateTime<Utc>>,
}

impl IdTokenOptions {
    /// `auth_time` is the Unix time at which the user authenticated.
    pub fn new(issuer: impl Into<String>, auth_time: i64) -> Self {
        Self {
            issuer: issuer.into(),
            auth_time,
            nonce: None,
            access_token: None,
            entitlements: None,
            expires_in: DEFAULT_ID_TOKEN_TTL_SECONDS,
            issued_at: None,
        }
    }

    /// Nonce from the authorization request, echoed verbatim
    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Access token issued alongside; bound through `at_hash`
    pub fn access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    pub fn entitlements(mut self, entitlements: Vec<String>) -> Self {
        self.entitlements = Some(entitlements);
        self
    }

    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.expires_in = seconds;
        self
    }

    /// Override `iat`; defaults to now.
    pub fn issued_at(mut self, at: DateTime<Utc>) -> Self {
        self.issued_at = Some(at);
        self
    }
}

/// `at_hash` for `access_token`: base64url of the left half of its SHA-256.
pub fn at_hash(access_token: &str) -> String {
    let digest = Sha256::digest(access_token.as_bytes());
    URL_SAFE_NO_PAD.encode(&digest[..16])
}

/// Sign an id_token for `principal`, audience `client_id`.
///
/// Profile and email claims follow `scopes` through the [`ClaimsBuilder`].
pub fn issue_id_token(
    principal: &Principal,
    client_id: &str,
    scopes: &[String],
    key: &SigningKey,
    claims: &ClaimsBuilder,
    options: &IdTokenOptions,
) -> Result<String> {
    let iat = options.issued_at.unwrap_or_else(Utc::now).timestamp();

    let mut payload = claims.build(principal, Some(scopes), options.entitlements.as_deref());
    payload.insert("iss".to_string(), Value::from(options.issuer.clone()));
    payload.insert("aud".to_string(), Value::from(client_id));
    payload.insert("iat".to_string(), Value::from(iat));
    payload.insert("exp".to_string(), Value::from(iat + options.expires_in));
    payload.insert("auth_time".to_string(), Value::from(options.auth_time));
    if let Some(nonce) = &options.nonce {
        payload.insert("nonce".to_string(), Value::from(nonce.clone()));
    }
    if let Some(access_token) = &options.access_token {
        payload.insert("at_hash".to_string(), Value::from(at_hash(access_token)));
    }

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(key.kid().to_string());

    let token = encode(&header, &payload, key.encoding_key())?;
    debug!(sub = %principal.id, aud = %client_id, kid = %key.kid(), "Issued id_token");
    Ok(token)
}

/// Claims of a verified id_token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub auth_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_hash: Option<String>,
    /// Profile, email and custom claims
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Verify signature, issuer, audience and expiry of an id_token.
pub fn verify_id_token(
    token: &str,
    key: &VerificationKey,
    issuer: &str,
    audience: &str,
) -> Result<IdTokenClaims> {
    let header = decode_header(token)?;
    if let (Some(expected), Some(actual)) = (key.kid(), header.kid.as_deref()) {
        if expected != actual {
            return Err(AuthError::Key(format!("Unknown key id: {}", actual)));
        }
    }

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_issuer(&[issuer]);
    validation.set_audience(&[audience]);
    validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

    let data = decode::<IdTokenClaims>(token, key.decoding_key(), &validation)?;
    Ok(data.claims)
}

//! Configuration for auth-core

use config::{Config as ConfigCrate, ConfigError, Environment as EnvSource, File, FileFormat};
use serde::Deserialize;
use crate::crypto::SecretCipher;
use crate::error::{AuthError, Result};
use crate::oidc::issuer::IssuerConfig;
use crate::oidc::keys::SigningKey;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Staging,
    #[default]
    Development,
}

impl Environment {
    /// Session cookies are scoped per environment so staging and local
    /// sessions never collide with production ones on shared parent domains.
    pub fn session_cookie_name(self) -> &'static str {
        match self {
            Environment::Production => "agora_session",
            Environment::Staging => "agora_session_staging",
            Environment::Development => "agora_session_dev",
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub environment: Environment,

    /// Base64 256-bit key for secrets at rest
    #[serde(default)]
    pub encryption_key: Option<String>,

    /// Private RSA JWK (JSON) used to sign id_tokens
    #[serde(default)]
    pub signing_jwk: Option<String>,

    #[serde(default)]
    pub oidc: OidcConfig,
}

/// OIDC issuance settings
#[derive(Debug, Clone, Deserialize)]
pub struct OidcConfig {
    #[serde(default = "default_production_issuer")]
    pub production_issuer: String,
    #[serde(default = "default_staging_issuer")]
    pub staging_issuer: String,
    /// Hosts equal to or ending in `.<suffix>` are staging
    #[serde(default = "default_staging_host_suffix")]
    pub staging_host_suffix: String,
    /// Public profile pages live at `<base>/<username>`
    #[serde(default = "default_profile_base_url")]
    pub profile_base_url: String,
    #[serde(default = "default_id_token_ttl")]
    pub id_token_ttl_seconds: i64,
}

fn default_production_issuer() -> String {
    "https://api.agora.community".to_string()
}

fn default_staging_issuer() -> String {
    "https://api.staging.agora.community".to_string()
}

fn default_staging_host_suffix() -> String {
    "staging.agora.community".to_string()
}

fn default_profile_base_url() -> String {
    "https://agora.community/u".to_string()
}

fn default_id_token_ttl() -> i64 {
    3600
}

impl Default for OidcConfig {
    fn default() -> Self {
        Self {
            production_issuer: default_production_issuer(),
            staging_issuer: default_staging_issuer(),
            staging_host_suffix: default_staging_host_suffix(),
            profile_base_url: default_profile_base_url(),
            id_token_ttl_seconds: default_id_token_ttl(),
        }
    }
}

impl OidcConfig {
    pub fn issuer_config(&self) -> IssuerConfig {
        IssuerConfig {
            production_issuer: self.production_issuer.clone(),
            staging_issuer: self.staging_issuer.clone(),
            staging_host_suffix: self.staging_host_suffix.clone(),
        }
    }
}

impl AuthConfig {
    /// Load from `AGORA_AUTH_*` environment variables; nested keys use `__`,
    /// e.g. `AGORA_AUTH_OIDC__PRODUCTION_ISSUER`.
    pub fn from_env() -> Result<Self> {
        ConfigCrate::builder()
            .add_source(
                EnvSource::with_prefix("AGORA_AUTH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(config_error)
    }

    /// Load from a TOML document
    pub fn from_toml(toml: &str) -> Result<Self> {
        ConfigCrate::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(config_error)
    }

    pub fn session_cookie_name(&self) -> &'static str {
        self.environment.session_cookie_name()
    }

    /// AEAD cipher, if a key is configured
    pub fn cipher(&self) -> Result<Option<SecretCipher>> {
        self.encryption_key
            .as_deref()
            .map(SecretCipher::from_base64_key)
            .transpose()
            .map_err(AuthError::from)
    }

    /// id_token signing key, if one is configured
    pub fn signing_key(&self) -> Result<Option<SigningKey>> {
        self.signing_jwk
            .as_deref()
            .map(SigningKey::from_jwk_json)
            .transpose()
    }
}

fn config_error(e: ConfigError) -> AuthError {
    AuthError::Config(e.to_string())
}

//! Secret handling: at-rest encryption, token digests and secret generation
//!
//! Stored secrets are sealed with AES-256-GCM under a 96-bit random nonce and
//! encoded as `base64(nonce):base64(ciphertext || tag)`. Token lookups use a
//! plain SHA-256 digest instead, since lookup keys never need decrypting.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine,
};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;
use tracing::debug;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const SEPARATOR: char = ':';

/// Prefix that identifies a personal access token in a bearer header
pub const API_TOKEN_PREFIX: &str = "agp_";

/// Number of leading characters of a raw token kept for display
const DISPLAY_PREFIX_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("Invalid key: expected 32 bytes")]
    InvalidKey,

    #[error("Malformed encrypted value")]
    MalformedBlob,

    #[error("Encryption failed")]
    Encryption,

    #[error("Decryption failed")]
    Decryption,
}

/// AEAD cipher for secrets at rest
#[derive(Clone)]
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretCipher(<redacted>)")
    }
}

impl SecretCipher {
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != KEY_LEN {
            return Err(CryptoError::InvalidKey);
        }
        let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::InvalidKey)?;
        Ok(Self { cipher })
    }

    /// Build from a standard base64 encoded 256-bit key
    pub fn from_base64_key(encoded: &str) -> Result<Self, CryptoError> {
        let key = STANDARD
            .decode(encoded.trim())
            .map_err(|_| CryptoError::InvalidKey)?;
        Self::new(&key)
    }

    /// Fresh random 256-bit key
    pub fn generate_key() -> [u8; KEY_LEN] {
        let mut key = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        key
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|_| CryptoError::Encryption)?;

        Ok(format!(
            "{}{}{}",
            STANDARD.encode(nonce_bytes),
            SEPARATOR,
            STANDARD.encode(ciphertext)
        ))
    }

    /// Fails closed: any tampering yields an error, never partial plaintext.
    pub fn decrypt(&self, blob: &str) -> Result<Vec<u8>, CryptoError> {
        let (nonce_bytes, ciphertext) = split_blob(blob).ok_or(CryptoError::MalformedBlob)?;
        if ciphertext.len() < TAG_LEN {
            return Err(CryptoError::MalformedBlob);
        }

        self.cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_slice())
            .map_err(|_| CryptoError::Decryption)
    }

    pub fn encrypt_str(&self, plaintext: &str) -> Result<String, CryptoError> {
        self.encrypt(plaintext.as_bytes())
    }

    pub fn decrypt_str(&self, blob: &str) -> Result<String, CryptoError> {
        let plaintext = self.decrypt(blob)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::Decryption)
    }

    /// Migration shim for columns that still hold legacy plaintext.
    ///
    /// Values shaped like `base64:base64` with a 12-byte first segment are
    /// decrypted, anything else (including values that fail to decrypt) is
    /// returned unchanged. A plaintext that happens to match the encrypted
    /// shape is misclassified; remove once every stored secret is encrypted.
    pub fn decrypt_or_passthrough(&self, stored: &str) -> String {
        if !looks_encrypted(stored) {
            return stored.to_string();
        }
        match self.decrypt_str(stored) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                debug!(error = %e, "stored value has encrypted shape but did not decrypt, using as-is");
                stored.to_string()
            }
        }
    }
}

fn split_blob(blob: &str) -> Option<([u8; NONCE_LEN], Vec<u8>)> {
    let (nonce_part, ciphertext_part) = blob.split_once(SEPARATOR)?;
    let nonce: [u8; NONCE_LEN] = STANDARD.decode(nonce_part).ok()?.try_into().ok()?;
    let ciphertext = STANDARD.decode(ciphertext_part).ok()?;
    Some((nonce, ciphertext))
}

/// Heuristic: does `value` have the two-segment encrypted shape?
pub fn looks_encrypted(value: &str) -> bool {
    split_blob(value).is_some_and(|(_, ciphertext)| ciphertext.len() >= TAG_LEN)
}

/// Deterministic lookup digest of a raw token (hex SHA-256).
pub fn hash_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

/// A freshly minted personal access token
#[derive(Clone)]
pub struct GeneratedToken {
    /// Shown to the owner once, never stored
    pub raw: String,
    pub digest: String,
    pub display_prefix: String,
}

impl fmt::Debug for GeneratedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedToken")
            .field("display_prefix", &self.display_prefix)
            .finish_non_exhaustive()
    }
}

pub fn generate_api_token() -> GeneratedToken {
    let mut secret = [0u8; 32];
    OsRng.fill_bytes(&mut secret);
    let raw = format!("{}{}", API_TOKEN_PREFIX, URL_SAFE_NO_PAD.encode(secret));

    GeneratedToken {
        digest: hash_token(&raw),
        display_prefix: raw.chars().take(DISPLAY_PREFIX_LEN).collect(),
        raw,
    }
}

/// 256-bit random session identifier, URL safe
pub fn generate_session_id() -> String {
    let mut id = [0u8; 32];
    OsRng.fill_bytes(&mut id);
    URL_SAFE_NO_PAD.encode(id)
}

//! RS256 key material
//!
//! Signing keys arrive as a private RSA JWK (or PKCS#8 PEM); verification
//! keys are the public half, published through the JWKS document.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{DecodingKey, EncodingKey};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPrivateKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::error::{AuthError, Result};

pub const RS256: &str = "RS256";

/// RSA JSON Web Key. Private members are absent on public keys.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct RsaJwk {
    pub kty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    pub n: String,
    pub e: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qi: Option<String>,
}

impl fmt::Debug for RsaJwk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaJwk")
            .field("kid", &self.kid)
            .field("alg", &self.alg)
            .field("private", &self.d.is_some())
            .finish_non_exhaustive()
    }
}

impl RsaJwk {
    /// Public half of this key
    pub fn to_public(&self) -> RsaJwk {
        RsaJwk {
            kty: self.kty.clone(),
            kid: self.kid.clone(),
            alg: Some(RS256.to_string()),
            key_use: Some("sig".to_string()),
            n: self.n.clone(),
            e: self.e.clone(),
            d: None,
            p: None,
            q: None,
            dp: None,
            dq: None,
            qi: None,
        }
    }
}

fn decode_uint(name: &str, value: Option<&str>) -> Result<BigUint> {
    let value = value.ok_or_else(|| AuthError::Key(format!("JWK is missing '{}'", name)))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| AuthError::Key(format!("JWK member '{}' is not base64url: {}", name, e)))?;
    Ok(BigUint::from_bytes_be(&bytes))
}

fn public_jwk(kid: &str, key: &RsaPrivateKey) -> RsaJwk {
    RsaJwk {
        kty: "RSA".to_string(),
        kid: Some(kid.to_string()),
        alg: Some(RS256.to_string()),
        key_use: Some("sig".to_string()),
        n: URL_SAFE_NO_PAD.encode(key.n().to_bytes_be()),
        e: URL_SAFE_NO_PAD.encode(key.e().to_bytes_be()),
        d: None,
        p: None,
        q: None,
        dp: None,
        dq: None,
        qi: None,
    }
}

/// RS256 private key with its key id
#[derive(Clone)]
pub struct SigningKey {
    kid: String,
    encoding_key: EncodingKey,
    public: RsaJwk,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey").field("kid", &self.kid).finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Build from a private RSA JWK. The JWK must carry a `kid`.
    pub fn from_jwk(jwk: &RsaJwk) -> Result<Self> {
        if jwk.kty != "RSA" {
            return Err(AuthError::Key(format!("Unsupported key type: {}", jwk.kty)));
        }
        if let Some(alg) = &jwk.alg {
            if alg != RS256 {
                return Err(AuthError::Key(format!("Unsupported algorithm: {}", alg)));
            }
        }
        let kid = jwk
            .kid
            .clone()
            .ok_or_else(|| AuthError::Key("JWK is missing 'kid'".to_string()))?;

        let n = decode_uint("n", Some(&jwk.n))?;
        let e = decode_uint("e", Some(&jwk.e))?;
        let d = decode_uint("d", jwk.d.as_deref())?;
        let p = decode_uint("p", jwk.p.as_deref())?;
        let q = decode_uint("q", jwk.q.as_deref())?;

        let private_key = RsaPrivateKey::from_components(n, e, d, vec![p, q])
            .map_err(|e| AuthError::Key(format!("Invalid RSA key: {}", e)))?;
        private_key
            .validate()
            .map_err(|e| AuthError::Key(format!("Invalid RSA key: {}", e)))?;

        Self::from_private_key(kid, &private_key)
    }

    pub fn from_jwk_json(json: &str) -> Result<Self> {
        let jwk: RsaJwk = serde_json::from_str(json)
            .map_err(|e| AuthError::Key(format!("Invalid JWK: {}", e)))?;
        Self::from_jwk(&jwk)
    }

    /// Build from a PKCS#8 PEM private key
    pub fn from_pkcs8_pem(kid: impl Into<String>, pem: &str) -> Result<Self> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| AuthError::Key(format!("Failed to parse private key: {}", e)))?;
        Self::from_private_key(kid.into(), &private_key)
    }

    /// Fresh 2048-bit key for local development
    pub fn generate(kid: impl Into<String>) -> Result<Self> {
        let mut rng = rand::rngs::OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, 2048)
            .map_err(|e| AuthError::Key(format!("Failed to generate RSA key: {}", e)))?;
        Self::from_private_key(kid.into(), &private_key)
    }

    fn from_private_key(kid: String, private_key: &RsaPrivateKey) -> Result<Self> {
        let der = private_key
            .to_pkcs1_der()
            .map_err(|e| AuthError::Key(format!("Failed to encode RSA key: {}", e)))?;
        Ok(Self {
            public: public_jwk(&kid, private_key),
            encoding_key: EncodingKey::from_rsa_der(der.as_bytes()),
            kid,
        })
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    /// Public JWK for the JWKS document
    pub fn public_jwk(&self) -> &RsaJwk {
        &self.public
    }

    pub fn verification_key(&self) -> Result<VerificationKey> {
        VerificationKey::from_jwk(&self.public)
    }
}

/// RS256 public key
#[derive(Clone)]
pub struct VerificationKey {
    kid: Option<String>,
    decoding_key: DecodingKey,
}

impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationKey").field("kid", &self.kid).finish_non_exhaustive()
    }
}

impl VerificationKey {
    pub fn from_jwk(jwk: &RsaJwk) -> Result<Self> {
        if jwk.kty != "RSA" {
            return Err(AuthError::Key(format!("Unsupported key type: {}", jwk.kty)));
        }
        let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)?;
        Ok(Self {
            kid: jwk.kid.clone(),
            decoding_key,
        })
    }

    pub fn kid(&self) -> Option<&str> {
        self.kid.as_deref()
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

/// JWKS document listing the public halves of `keys`
pub fn jwks_document<'a>(keys: impl IntoIterator<Item = &'a SigningKey>) -> serde_json::Value {
    let keys: Vec<&RsaJwk> = keys.into_iter().map(SigningKey::public_jwk).collect();
    serde_json::json!({ "keys": keys })
}

#[cfg(test)]
mod tests {
    use super::*;

    const JWK: &str = include_str!("../../tests/fixtures/signing_key.jwk.json");
    const PEM: &str = include_str!("../../tests/fixtures/signing_key.pem");

    #[test]
    fn test_jwk_and_pem_agree() {
        let from_jwk = SigningKey::from_jwk_json(JWK).unwrap();
        let from_pem = SigningKey::from_pkcs8_pem("test-key-1", PEM).unwrap();
        assert_eq!(from_jwk.public_jwk(), from_pem.public_jwk());
        assert_eq!(from_jwk.kid(), "test-key-1");
    }

    #[test]
    fn test_public_jwk_has_no_private_members() {
        let key = SigningKey::from_jwk_json(JWK).unwrap();
        let public = serde_json::to_value(key.public_jwk()).unwrap();
        for member in ["d", "p", "q", "dp", "dq", "qi"] {
            assert!(public.get(member).is_none(), "public jwk leaked '{}'", member);
        }
        assert_eq!(public["alg"], "RS256");
        assert_eq!(public["use"], "sig");
        assert_eq!(public["kid"], "test-key-1");
    }

    #[test]
    fn test_public_jwk_cannot_sign() {
        let key = SigningKey::from_jwk_json(JWK).unwrap();
        let result = SigningKey::from_jwk(key.public_jwk());
        assert!(matches!(result, Err(AuthError::Key(_))));
    }

    #[test]
    fn test_rejects_non_rs256_jwk() {
        let mut jwk: RsaJwk = serde_json::from_str(JWK).unwrap();
        jwk.alg = Some("PS256".to_string());
        assert!(SigningKey::from_jwk(&jwk).is_err());
    }

    #[test]
    fn test_missing_kid_rejected() {
        let mut jwk: RsaJwk = serde_json::from_str(JWK).unwrap();
        jwk.kid = None;
        assert!(SigningKey::from_jwk(&jwk).is_err());
    }

    #[test]
    fn test_jwks_document() {
        let key = SigningKey::from_jwk_json(JWK).unwrap();
        let doc = jwks_document([&key]);
        assert_eq!(doc["keys"].as_array().unwrap().len(), 1);
        assert_eq!(doc["keys"][0]["kty"], "RSA");
        assert!(doc["keys"][0].get("d").is_none());
    }

    #[test]
    fn test_debug_redacts_private_material() {
        let jwk: RsaJwk = serde_json::from_str(JWK).unwrap();
        let debug = format!("{:?}", jwk);
        assert!(!debug.contains(jwk.d.as_deref().unwrap()));
    }
}

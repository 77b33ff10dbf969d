//! id_token issuance, verification and token-response augmentation

mod common;

use agora_auth_core::oidc::{
    at_hash, canonical_issuer, issue_id_token, verify_id_token, ClaimsBuilder, IdTokenAugmenter,
    IdTokenOptions, IssuerConfig, ENTITLEMENTS_CLAIM,
};
use agora_auth_core::{AuthError, ManualClock};
use agora_users_core::{MemoryStore, PlatformRole};
use chrono::{TimeZone, Utc};
use common::*;
use serde_json::json;
use std::sync::Arc;

const ISSUER: &str = "https://api.agora.community";

fn claims_builder() -> ClaimsBuilder {
    ClaimsBuilder::new("https://agora.community/u")
}

fn scopes(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_nonce_and_at_hash_are_bound() {
    let key = signing_key();
    let options = IdTokenOptions::new(ISSUER, 1_700_000_000)
        .nonce("abc123")
        .access_token("sample-access-token");
    let token = issue_id_token(
        &principal("u1", "alice", PlatformRole::User),
        "client-1",
        &scopes(&["openid"]),
        &key,
        &claims_builder(),
        &options,
    )
    .unwrap();

    let claims = verify_id_token(&token, &key.verification_key().unwrap(), ISSUER, "client-1").unwrap();
    assert_eq!(claims.nonce.as_deref(), Some("abc123"));
    assert_eq!(claims.at_hash.as_deref(), Some("EN9PvSfRnJ9qwbHAFRGqMw"));
    assert_eq!(claims.aud, "client-1");
    assert_eq!(claims.iss, ISSUER);
}

#[test]
fn test_verification_rejects_mismatches() {
    let key = signing_key();
    let token = issue_id_token(
        &principal("u1", "alice", PlatformRole::User),
        "client-1",
        &scopes(&["openid"]),
        &key,
        &claims_builder(),
        &IdTokenOptions::new(ISSUER, 0),
    )
    .unwrap();
    let verification = key.verification_key().unwrap();

    assert!(verify_id_token(&token, &verification, "https://evil.example", "client-1").is_err());
    assert!(verify_id_token(&token, &verification, ISSUER, "client-2").is_err());

    let stranger = other_key().verification_key().unwrap();
    assert!(verify_id_token(&token, &stranger, ISSUER, "client-1").is_err());

    let mut tampered = token.clone();
    tampered.push('x');
    assert!(matches!(
        verify_id_token(&tampered, &verification, ISSUER, "client-1"),
        Err(AuthError::Jwt(_))
    ));
}

#[test]
fn test_email_visibility_follows_scopes() {
    let key = signing_key();
    let alice = principal("u1", "alice", PlatformRole::User);
    let verification = key.verification_key().unwrap();

    for (granted, expect_email) in [
        (scopes(&["openid"]), false),
        (scopes(&["openid", "profile"]), false),
        (scopes(&["openid", "email"]), true),
        (scopes(&["openid", "user:email"]), true),
        (scopes(&["openid", "user"]), true),
    ] {
        let token = issue_id_token(
            &alice,
            "client-1",
            &granted,
            &key,
            &claims_builder(),
            &IdTokenOptions::new(ISSUER, 0),
        )
        .unwrap();
        let claims = verify_id_token(&token, &verification, ISSUER, "client-1").unwrap();
        assert_eq!(claims.extra.contains_key("email"), expect_email, "scopes {:?}", granted);
    }
}

#[test]
fn test_entitlements_claim() {
    let key = signing_key();
    let options = IdTokenOptions::new(ISSUER, 0).entitlements(vec!["organizer".to_string()]);
    let token = issue_id_token(
        &principal("u1", "alice", PlatformRole::User),
        "client-1",
        &scopes(&["openid", "profile"]),
        &key,
        &claims_builder(),
        &options,
    )
    .unwrap();
    let claims = verify_id_token(&token, &key.verification_key().unwrap(), ISSUER, "client-1").unwrap();
    assert_eq!(claims.extra[ENTITLEMENTS_CLAIM], json!(["organizer"]));
}

#[test]
fn test_canonical_issuer_is_consistent() {
    let config = IssuerConfig {
        production_issuer: ISSUER.to_string(),
        staging_issuer: "https://api.staging.agora.community".to_string(),
        staging_host_suffix: "staging.agora.community".to_string(),
    };
    assert_eq!(canonical_issuer("agora.community", &config), ISSUER);
    assert_eq!(canonical_issuer("www.agora.community", &config), ISSUER);
    assert_eq!(
        canonical_issuer("app.staging.agora.community", &config),
        "https://api.staging.agora.community"
    );
    assert_eq!(canonical_issuer("localhost:8787", &config), "http://localhost:8787");
}

fn augmenter(store: MemoryStore, unwrapper: Arc<FakeUnwrapper>, with_key: bool) -> IdTokenAugmenter {
    let key = with_key.then(|| Arc::new(signing_key()));
    IdTokenAugmenter::new(unwrapper, Arc::new(store), key, claims_builder()).clock(Arc::new(ManualClock::new(
        Utc::now(),
    )))
}

#[tokio::test]
async fn test_augment_adds_id_token() {
    let store = MemoryStore::new();
    store.insert_principal(principal("u1", "alice", PlatformRole::User));
    let unwrapper = Arc::new(FakeUnwrapper::new());
    unwrapper.insert(
        "opaque-access-token-123",
        grant("u1", "client-1", &["openid", "email"], Some("n-0S6_WzA2Mj")),
    );

    let response = json!({
        "access_token": "opaque-access-token-123",
        "token_type": "bearer",
        "expires_in": 3600,
        "scope": "openid email"
    });
    let augmented = augmenter(store, unwrapper, true).augment(response, ISSUER).await;

    let id_token = augmented["id_token"].as_str().unwrap();
    let claims = verify_id_token(
        id_token,
        &signing_key().verification_key().unwrap(),
        ISSUER,
        "client-1",
    )
    .unwrap();
    assert_eq!(claims.sub, "u1");
    assert_eq!(claims.nonce.as_deref(), Some("n-0S6_WzA2Mj"));
    assert_eq!(claims.at_hash.as_deref(), Some(at_hash("opaque-access-token-123").as_str()));
    assert_eq!(claims.at_hash.as_deref(), Some("zMSIeJX-vV8F4FmQ9cew9w"));
    assert_eq!(claims.auth_time, 1_700_000_000);
    assert_eq!(claims.extra["email"], "alice@example.com");
    assert_eq!(augmented["token_type"], "bearer");
}

#[tokio::test]
async fn test_augment_requires_openid_and_key() {
    let store = MemoryStore::new();
    store.insert_principal(principal("u1", "alice", PlatformRole::User));
    let unwrapper = Arc::new(FakeUnwrapper::new());
    unwrapper.insert("at-openid", grant("u1", "client-1", &["openid"], None));
    unwrapper.insert("at-plain", grant("u1", "client-1", &["read:events"], None));

    let no_openid = json!({ "access_token": "at-plain", "scope": "read:events" });
    let augmented = augmenter(store.clone(), unwrapper.clone(), true)
        .augment(no_openid.clone(), ISSUER)
        .await;
    assert_eq!(augmented, no_openid);

    let openid = json!({ "access_token": "at-openid", "scope": "openid" });
    let augmented = augmenter(store, unwrapper, false).augment(openid.clone(), ISSUER).await;
    assert_eq!(augmented, openid);
}

#[tokio::test]
async fn test_augment_failures_return_original_response() {
    let store = MemoryStore::new();
    let unwrapper = Arc::new(FakeUnwrapper::new());
    unwrapper.insert("at-ghost", grant("missing", "client-1", &["openid"], None));
    let augmenter = augmenter(store, unwrapper, true);

    for response in [
        json!({ "access_token": BROKEN_OAUTH_TOKEN, "scope": "openid" }),
        json!({ "access_token": "at-unknown", "scope": "openid" }),
        json!({ "access_token": "at-ghost", "scope": "openid" }),
        json!({ "scope": "openid" }),
    ] {
        assert_eq!(augmenter.augment(response.clone(), ISSUER).await, response);
    }
}

#[tokio::test]
async fn test_augmented_token_uses_clock_for_iat() {
    let store = MemoryStore::new();
    store.insert_principal(principal("u1", "alice", PlatformRole::User));
    let unwrapper = Arc::new(FakeUnwrapper::new());
    unwrapper.insert("at-1", grant("u1", "client-1", &["openid"], None));

    let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    let augmenter = IdTokenAugmenter::new(unwrapper, Arc::new(store), Some(Arc::new(signing_key())), claims_builder())
        .ttl_seconds(600)
        .clock(Arc::new(ManualClock::new(now)));

    let augmented = augmenter.augment(json!({ "access_token": "at-1", "scope": "openid" }), ISSUER).await;
    let claims = verify_id_token(
        augmented["id_token"].as_str().unwrap(),
        &signing_key().verification_key().unwrap(),
        ISSUER,
        "client-1",
    )
    .unwrap();
    assert_eq!(claims.iat, now.timestamp());
    assert_eq!(claims.exp, now.timestamp() + 600);
}

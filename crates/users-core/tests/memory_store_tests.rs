//! Tests for the in-memory datastore
//! These double as examples of the datastore contract auth-core relies on

use agora_users_core::{
    ApiToken, ApiTokenStore, GroupMembership, GroupRole, MembershipStore, MemoryStore,
    PlatformRole, Principal, Session, SessionStore, UserStore,
};
use chrono::{Duration, Utc};

fn principal(id: &str, username: &str) -> Principal {
    Principal {
        id: id.to_string(),
        username: username.to_string(),
        display_name: Some(format!("{} display", username)),
        avatar_url: None,
        email: Some(format!("{}@example.com", username)),
        role: PlatformRole::User,
        updated_at: Utc::now(),
    }
}

fn api_token(id: &str, owner_id: &str, hash: &str) -> ApiToken {
    ApiToken {
        id: id.to_string(),
        owner_id: owner_id.to_string(),
        token_hash: hash.to_string(),
        token_prefix: "agp_0000".to_string(),
        scopes: vec!["read:events".to_string()],
        expires_at: None,
        last_used_at: None,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_get_principal() {
    let store = MemoryStore::new();
    store.insert_principal(principal("u1", "alice"));

    let found = store.get_principal("u1").await.unwrap().unwrap();
    assert_eq!(found.username, "alice");
    assert!(store.get_principal("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_api_token_lookup_is_by_digest() {
    let store = MemoryStore::new();
    store.insert_api_token(api_token("t1", "u1", "digest-1")).unwrap();

    assert!(store.find_api_token("digest-1").await.unwrap().is_some());
    assert!(store.find_api_token("t1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_token_digest_rejected() {
    let store = MemoryStore::new();
    store.insert_api_token(api_token("t1", "u1", "digest-1")).unwrap();

    let result = store.insert_api_token(api_token("t2", "u1", "digest-1"));
    assert!(matches!(result, Err(agora_users_core::Error::AlreadyExists(_))));
}

#[tokio::test]
async fn test_touch_api_token_records_usage() {
    let store = MemoryStore::new();
    store.insert_api_token(api_token("t1", "u1", "digest-1")).unwrap();

    let used_at = Utc::now();
    store.touch_api_token("t1", used_at).await.unwrap();
    assert_eq!(store.api_token("t1").unwrap().last_used_at, Some(used_at));

    assert!(store.touch_api_token("nope", used_at).await.is_err());
}

#[tokio::test]
async fn test_set_api_token_expiry() {
    let store = MemoryStore::new();
    store.insert_api_token(api_token("t1", "u1", "digest-1")).unwrap();

    let yesterday = Utc::now() - Duration::days(1);
    store.set_api_token_expiry("t1", Some(yesterday)).unwrap();
    assert_eq!(store.api_token("t1").unwrap().expires_at, Some(yesterday));
}

#[tokio::test]
async fn test_active_session_lookup_respects_expiry() {
    let store = MemoryStore::new();
    store.insert_principal(principal("u1", "alice"));

    let now = Utc::now();
    store.insert_session(Session {
        id: "sess-1".to_string(),
        owner_id: "u1".to_string(),
        expires_at: now + Duration::hours(1),
        created_at: now,
    });

    let (session, owner) = store.find_active_session("sess-1", now).await.unwrap().unwrap();
    assert_eq!(session.owner_id, "u1");
    assert_eq!(owner.username, "alice");

    let at_expiry = now + Duration::hours(1);
    assert!(store.find_active_session("sess-1", at_expiry).await.unwrap().is_none());
}

#[tokio::test]
async fn test_session_with_missing_owner_is_not_found() {
    let store = MemoryStore::new();
    let now = Utc::now();
    store.insert_session(Session {
        id: "orphan".to_string(),
        owner_id: "ghost".to_string(),
        expires_at: now + Duration::hours(1),
        created_at: now,
    });

    assert!(store.find_active_session("orphan", now).await.unwrap().is_none());
}

#[tokio::test]
async fn test_membership_lookup() {
    let store = MemoryStore::new();
    store.insert_membership(GroupMembership {
        group_id: "g1".to_string(),
        user_id: "u1".to_string(),
        role: GroupRole::Volunteer,
        joined_at: Utc::now(),
    });

    let membership = store.get_membership("g1", "u1").await.unwrap().unwrap();
    assert_eq!(membership.role, GroupRole::Volunteer);
    assert!(store.get_membership("g1", "u2").await.unwrap().is_none());
    assert!(store.get_membership("g2", "u1").await.unwrap().is_none());
}

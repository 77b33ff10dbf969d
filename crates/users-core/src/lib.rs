//! # Users-Core
//!
//! Identity records for the Agora community platform.
//!
//! This crate provides:
//! - The resolved caller identity ([`Principal`]) and platform roles
//! - Personal access token and browser session records
//! - Group memberships and the group-role hierarchy
//! - The datastore interface the auth layer reads through
//! - An in-memory store for tests and local development
//!
//! ## Architecture
//!
//! Users-Core owns the records; auth-core resolves credentials against them.
//! Nothing in this crate hashes, encrypts or verifies anything.

pub mod error;
pub mod types;
pub mod api_tokens;
pub mod store;
pub mod memory;

pub use error::{Error, Result};
pub use types::{GroupMembership, GroupRole, PlatformRole, Principal, Session};
pub use api_tokens::{ApiToken, ApiTokenStore};
pub use store::{Datastore, MembershipStore, SessionStore, UserStore};
pub use memory::MemoryStore;

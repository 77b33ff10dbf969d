//! OpenID Connect support: claims, id_tokens, issuer selection, discovery
//! metadata and token-response augmentation.

pub mod claims;
pub mod discovery;
pub mod exchange;
pub mod issuer;
pub mod keys;
pub mod token;

pub use claims::{can_view_email, can_view_profile, ClaimsBuilder, ProfileView, ENTITLEMENTS_CLAIM};
pub use discovery::DiscoveryDocument;
pub use exchange::IdTokenAugmenter;
pub use issuer::{canonical_issuer, IssuerConfig};
pub use keys::{jwks_document, RsaJwk, SigningKey, VerificationKey};
pub use token::{at_hash, issue_id_token, verify_id_token, IdTokenClaims, IdTokenOptions};

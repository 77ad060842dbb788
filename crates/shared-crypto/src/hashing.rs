//! # BLAKE3 Hashing
//!
//! One-shot digests and domain-separated address derivation.

use shared_types::{AccountRef, AssetId, PublicIdentity};

/// BLAKE3 hash output (256-bit).
pub type Hash = [u8; 32];

/// Derivation context for asset holding accounts.
const HOLDING_ACCOUNT_CONTEXT: &str = "genesis-distribution 2024 holding account v1";

/// Hash data with BLAKE3 (one-shot).
pub fn blake3_hash(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Derive a 32-byte address from a context string and ordered parts.
///
/// Parts are length-prefixed so `["ab", "c"]` and `["a", "bc"]` differ.
pub fn derive_address(context: &str, parts: &[&[u8]]) -> Hash {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

/// Deterministic holding account for `owner` bound to `asset`.
///
/// Create-or-get semantics on the ledger rely on this being a pure function.
pub fn derive_holding_account(owner: &PublicIdentity, asset: &AssetId) -> AccountRef {
    AccountRef(derive_address(
        HOLDING_ACCOUNT_CONTEXT,
        &[owner.as_bytes(), asset.as_bytes()],
    ))
}

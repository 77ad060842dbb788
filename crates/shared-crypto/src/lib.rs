//! # Shared Crypto
//!
//! Key material and hashing used by the genesis orchestrator.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `signatures` | Ed25519 | Controller, asset and recipient identities; operation signing |
//! | `hashing` | BLAKE3 | Holding-account derivation, manifest digests |
//!
//! ## Security Properties
//!
//! - **Ed25519**: Deterministic nonces, no RNG dependency when signing
//! - **Secrets**: seeds leave a keypair only inside `Zeroizing` buffers

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod signatures;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{blake3_hash, derive_address, derive_holding_account};
pub use signatures::{verify_signature, Ed25519KeyPair, Ed25519Signature};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

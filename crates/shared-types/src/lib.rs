//! # Shared Types Crate
//!
//! Identifiers exchanged between the genesis orchestrator and the ledger
//! boundary.
//!
//! ## Design Principles
//!
//! - **Fixed-width bytes**: identities, accounts and assets are 32-byte
//!   values; transaction signatures are 64 bytes.
//! - **Hex on the wire**: every byte type serializes as a lowercase hex
//!   string so checkpoints and manifests stay human-auditable.
//! - **No secrets**: secret key material never appears in this crate.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;

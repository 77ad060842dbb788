//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Signature verification failed
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Invalid public key
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Invalid private key
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// Seed does not reproduce the identity it was stored with
    #[error("Seed does not match stored identity {expected}")]
    IdentityMismatch {
        /// Identity recorded next to the seed
        expected: String,
    },
}

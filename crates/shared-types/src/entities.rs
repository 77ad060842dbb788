//! # Ledger Entities
//!
//! ## Clusters
//!
//! - **Identity**: `PublicIdentity`, `AccountRef`
//! - **Asset**: `AssetId`
//! - **Transactions**: `TxSignature`, `ConfirmationReceipt`

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

use crate::errors::TypesError;

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], TypesError> {
    let bytes = hex::decode(s).map_err(|e| TypesError::InvalidHex(e.to_string()))?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| TypesError::InvalidLength {
        expected: N,
        actual,
    })
}

/// Implements hex `Display`, `FromStr` and byte accessors for a fixed-width newtype.
macro_rules! hex_newtype {
    ($name:ident, $len:expr) => {
        impl $name {
            /// Byte width of this identifier.
            pub const LEN: usize = $len;

            /// Wrap raw bytes.
            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Raw bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Abbreviated hex form used in log lines.
            pub fn short(&self) -> String {
                hex::encode(&self.0[..4])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.short())
            }
        }

        impl FromStr for $name {
            type Err = TypesError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_fixed::<$len>(s).map(Self)
            }
        }
    };
}

// =============================================================================
// IDENTITY
// =============================================================================

/// An Ed25519 public key identifying a signer on the ledger.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublicIdentity(#[serde_as(as = "Hex")] pub [u8; 32]);

hex_newtype!(PublicIdentity, 32);

/// Address of a ledger account (for example an asset holding account).
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountRef(#[serde_as(as = "Hex")] pub [u8; 32]);

hex_newtype!(AccountRef, 32);

impl From<PublicIdentity> for AccountRef {
    /// A signer's own system account shares its address with its identity.
    fn from(identity: PublicIdentity) -> Self {
        Self(identity.0)
    }
}

// =============================================================================
// ASSET
// =============================================================================

/// Identifier of a fungible asset definition on the ledger.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(#[serde_as(as = "Hex")] pub [u8; 32]);

hex_newtype!(AssetId, 32);

impl From<PublicIdentity> for AssetId {
    /// The asset account address is the public key of its asset keypair.
    fn from(identity: PublicIdentity) -> Self {
        Self(identity.0)
    }
}

// =============================================================================
// TRANSACTIONS
// =============================================================================

/// Signature of a submitted transaction; doubles as its ledger identifier.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxSignature(#[serde_as(as = "Hex")] pub [u8; 64]);

hex_newtype!(TxSignature, 64);

/// Proof that the ledger finalized a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationReceipt {
    /// Transaction signature.
    pub signature: TxSignature,
    /// Ledger slot (or height) the transaction landed in.
    pub slot: u64,
    /// Ledger time of confirmation.
    pub confirmed_at: DateTime<Utc>,
}

//! Credential store adapters.
//!
//! Keys are generated at most once per name. A generated key is durably
//! written (create-new, fsync, owner-only permissions) before it is handed
//! to the caller, so nothing is ever signed with a key that could be lost.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared_crypto::Ed25519KeyPair;
use shared_types::PublicIdentity;
use tracing::{debug, info};
use zeroize::{Zeroize, Zeroizing};

use super::fs::{read_optional, write_new_atomic};
use crate::error::{GenesisError, GenesisResult};
use crate::ports::outbound::{Credential, CredentialProvider};

const CREDENTIAL_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct StoredCredential {
    version: u32,
    name: String,
    public_identity: PublicIdentity,
    /// Hex-encoded 32-byte Ed25519 seed
    secret_seed: String,
    created_at: DateTime<Utc>,
}

impl Drop for StoredCredential {
    fn drop(&mut self) {
        self.secret_seed.zeroize();
    }
}

fn credential_error(name: &str, reason: impl std::fmt::Display) -> GenesisError {
    GenesisError::Credential {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_name(name: &str) -> GenesisResult<()> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_');
    if !valid {
        return Err(credential_error(name, "name must be [a-z0-9_-], at most 64 chars"));
    }
    Ok(())
}

/// One JSON file per identity under a credentials directory.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> GenesisResult<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{name}.json")))
    }

    fn read(&self, name: &str) -> GenesisResult<Option<StoredCredential>> {
        let path = self.path_for(name)?;
        let Some(bytes) = read_optional(&path).map_err(|e| credential_error(name, e))? else {
            return Ok(None);
        };
        let bytes = Zeroizing::new(bytes);
        let stored: StoredCredential = serde_json::from_slice(&bytes)
            .map_err(|e| credential_error(name, format!("corrupt credential file: {e}")))?;
        if stored.version != CREDENTIAL_VERSION || stored.name != name {
            return Err(credential_error(
                name,
                format!("unexpected credential file {}", path.display()),
            ));
        }
        Ok(Some(stored))
    }

    fn restore(name: &str, stored: &StoredCredential) -> GenesisResult<Ed25519KeyPair> {
        let mut seed = Zeroizing::new([0u8; 32]);
        hex::decode_to_slice(&stored.secret_seed, &mut seed[..])
            .map_err(|e| credential_error(name, format!("malformed seed: {e}")))?;
        Ed25519KeyPair::restore(&seed, &stored.public_identity).map_err(|e| credential_error(name, e))
    }

    fn load(&self, name: &str) -> GenesisResult<Option<Credential>> {
        match self.read(name)? {
            Some(stored) => {
                let keypair = Self::restore(name, &stored)?;
                debug!("[genesis] Loaded credential {} ({})", name, stored.public_identity.short());
                Ok(Some(Credential {
                    name: name.to_string(),
                    keypair: Arc::new(keypair),
                    freshly_created: false,
                }))
            }
            None => Ok(None),
        }
    }
}

impl CredentialProvider for FileCredentialStore {
    fn load_or_create(&self, name: &str) -> GenesisResult<Credential> {
        if let Some(credential) = self.load(name)? {
            return Ok(credential);
        }

        let keypair = Ed25519KeyPair::generate();
        let stored = StoredCredential {
            version: CREDENTIAL_VERSION,
            name: name.to_string(),
            public_identity: keypair.identity(),
            secret_seed: hex::encode(&keypair.to_seed()[..]),
            created_at: Utc::now(),
        };
        let bytes = Zeroizing::new(
            serde_json::to_vec_pretty(&stored).map_err(|e| credential_error(name, e))?,
        );

        let path = self.path_for(name)?;
        match write_new_atomic(&path, &bytes, true) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                // another writer won; use its key
                return self
                    .load(name)?
                    .ok_or_else(|| credential_error(name, "credential vanished after creation"));
            }
            Err(e) => return Err(credential_error(name, e)),
        }

        info!(
            "[genesis] 🔑 Generated credential {} ({})",
            name,
            stored.public_identity
        );
        Ok(Credential {
            name: name.to_string(),
            keypair: Arc::new(keypair),
            freshly_created: true,
        })
    }

    fn peek_identity(&self, name: &str) -> GenesisResult<Option<PublicIdentity>> {
        Ok(self.read(name)?.map(|stored| stored.public_identity))
    }
}

/// Process-local credential store for tests and rehearsals.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    keys: Mutex<HashMap<String, Arc<Ed25519KeyPair>>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of identities held.
    pub fn len(&self) -> usize {
        self.keys.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.lock().is_empty()
    }
}

impl CredentialProvider for InMemoryCredentialStore {
    fn load_or_create(&self, name: &str) -> GenesisResult<Credential> {
        validate_name(name)?;
        let mut keys = self.keys.lock();
        let mut freshly_created = false;
        let keypair = keys
            .entry(name.to_string())
            .or_insert_with(|| {
                freshly_created = true;
                Arc::new(Ed25519KeyPair::generate())
            })
            .clone();
        Ok(Credential {
            name: name.to_string(),
            keypair,
            freshly_created,
        })
    }

    fn peek_identity(&self, name: &str) -> GenesisResult<Option<PublicIdentity>> {
        Ok(self.keys.lock().get(name).map(|k| k.identity()))
    }
}

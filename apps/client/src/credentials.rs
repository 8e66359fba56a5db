//! Local credential storage — the synchronous key-value area holding the bearer token.
//!
//! Every reader (request client, endpoint resolver, navigation guard) calls `get()` per
//! operation. Nothing caches the token, so a login or logout takes effect on the next call.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

const TOKEN_KEY: &str = "token";
const CREDENTIAL_FILE: &str = "local_storage.json";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Credential file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Credential file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Process-wide credential slot. Last writer wins; there is no lock across calls.
pub trait CredentialStore: Send + Sync {
    /// Returns the stored token. Empty strings count as absent.
    fn get(&self) -> Option<String>;

    fn set(&self, token: &str) -> Result<(), CredentialError>;

    /// Removes the token. Clearing an empty slot succeeds.
    fn clear(&self) -> Result<(), CredentialError>;

    fn is_present(&self) -> bool {
        self.get().is_some()
    }
}

/// In-memory credential slot, used by tests and embedders that own persistence.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(Some(token.to_string())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<String> {
        let guard = self.token.read().unwrap_or_else(|e| e.into_inner());
        guard.clone().filter(|t| !t.is_empty())
    }

    fn set(&self, token: &str) -> Result<(), CredentialError> {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
        Ok(())
    }
}

/// File-backed key-value area under the data directory. Survives restarts.
///
/// The file is a flat JSON object; only the `token` key is used by this crate, other
/// keys are preserved on rewrite. Writes go through a temp file and a rename.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(CREDENTIAL_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, CredentialError> {
        match std::fs::read(&self.path) {
            Ok(raw) if raw.is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Map to rewrite on `set`/`clear`. A corrupt file is replaced with a warning;
    /// an unreadable one is an error, since its other keys cannot be preserved.
    fn map_for_update(&self) -> Result<BTreeMap<String, String>, CredentialError> {
        match self.read_map() {
            Err(CredentialError::Corrupt(e)) => {
                warn!(
                    "Credential file {} is corrupt ({e}); replacing it",
                    self.path.display()
                );
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension(format!("{}.tmp", Uuid::new_v4()));
        std::fs::write(&tmp, serde_json::to_vec_pretty(map)?)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<String> {
        match self.read_map() {
            Ok(mut map) => map.remove(TOKEN_KEY).filter(|t| !t.is_empty()),
            Err(e) => {
                // An unreadable credential file reads as "logged out".
                warn!("Credential file {} unreadable: {e}", self.path.display());
                None
            }
        }
    }

    fn set(&self, token: &str) -> Result<(), CredentialError> {
        let mut map = self.map_for_update()?;
        map.insert(TOKEN_KEY.to_string(), token.to_string());
        self.write_map(&map)?;
        debug!("Credential stored at {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        let mut map = self.map_for_update()?;
        if map.remove(TOKEN_KEY).is_none() {
            return Ok(());
        }
        self.write_map(&map)?;
        debug!("Credential cleared");
        Ok(())
    }
}

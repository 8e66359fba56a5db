//! Durable Draft Store — a single-slot persistent object store for the pending résumé.
//!
//! Layout under the data directory:
//!
//! ```text
//! InterviewDB/
//!   VERSION                    schema version marker
//!   resume_files/
//!     current_resume           record: magic, header length, JSON header, file bytes
//! ```
//!
//! The store is opened lazily. All handles for the same directory share one
//! `StoreHandle` per process, so repeated or concurrent `initialize()` calls converge.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};
use uuid::Uuid;

pub const DB_NAME: &str = "InterviewDB";
pub const DB_VERSION: u32 = 1;
pub const STORE_NAME: &str = "resume_files";
/// The only key this store ever holds.
pub const DRAFT_KEY: &str = "current_resume";

const VERSION_FILE: &str = "VERSION";
const RECORD_MAGIC: &[u8; 4] = b"IDR1";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Persistent storage unavailable at {path}: {reason}")]
    Unavailable { path: PathBuf, reason: String },

    #[error("Failed to write draft: {0}")]
    Write(#[source] std::io::Error),

    #[error("Failed to read draft: {0}")]
    Read(#[source] std::io::Error),

    #[error("Stored draft is corrupt: {0}")]
    Corrupt(String),

    #[error("Failed to read source file {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    fn unavailable(path: &Path, reason: impl std::fmt::Display) -> Self {
        StorageError::Unavailable {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// The staged résumé file: bytes plus the name and media type it was picked with.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftArtifact {
    pub file_name: String,
    pub media_type: String,
    pub data: Bytes,
    pub saved_at: DateTime<Utc>,
}

impl DraftArtifact {
    pub fn new(file_name: impl Into<String>, media_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            data,
            saved_at: Utc::now(),
        }
    }

    /// Reads a file from disk, inferring the media type from its extension.
    pub async fn from_path(path: &Path) -> Result<Self, StorageError> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|source| StorageError::Source {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DRAFT_KEY.to_string());
        let media_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();
        Ok(Self::new(file_name, media_type, Bytes::from(data)))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RecordHeader {
    file_name: String,
    media_type: String,
    size: u64,
    saved_at: DateTime<Utc>,
}

/// Open handle to one on-disk object store. Shared process-wide per directory.
#[derive(Debug)]
pub struct StoreHandle {
    db_dir: PathBuf,
    store_dir: PathBuf,
    version: u32,
}

impl StoreHandle {
    pub fn db_dir(&self) -> &Path {
        &self.db_dir
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    fn record_path(&self) -> PathBuf {
        self.store_dir.join(DRAFT_KEY)
    }

    async fn put(&self, artifact: &DraftArtifact) -> Result<(), StorageError> {
        let record = encode_record(artifact)?;
        let target = self.record_path();
        let tmp = self.store_dir.join(format!(".{DRAFT_KEY}.{}.tmp", Uuid::new_v4()));

        let written = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(&record).await?;
            file.sync_all().await?;
            tokio::fs::rename(&tmp, &target).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StorageError::Write(e));
        }
        debug!(
            "Draft '{}' saved ({} bytes)",
            artifact.file_name,
            artifact.data.len()
        );
        Ok(())
    }

    async fn get(&self) -> Result<Option<DraftArtifact>, StorageError> {
        match tokio::fs::read(self.record_path()).await {
            Ok(raw) => decode_record(Bytes::from(raw)).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Read(e)),
        }
    }

    async fn delete(&self) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.record_path()).await {
            Ok(()) => {
                debug!("Draft cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Write(e)),
        }
    }
}

fn encode_record(artifact: &DraftArtifact) -> Result<Vec<u8>, StorageError> {
    let header = RecordHeader {
        file_name: artifact.file_name.clone(),
        media_type: artifact.media_type.clone(),
        size: artifact.data.len() as u64,
        saved_at: artifact.saved_at,
    };
    let header = serde_json::to_vec(&header).map_err(|e| StorageError::Corrupt(e.to_string()))?;
    let header_len = u32::try_from(header.len())
        .map_err(|_| StorageError::Corrupt("record header too large".to_string()))?;

    let mut out = Vec::with_capacity(8 + header.len() + artifact.data.len());
    out.extend_from_slice(RECORD_MAGIC);
    out.extend_from_slice(&header_len.to_be_bytes());
    out.extend_from_slice(&header);
    out.extend_from_slice(&artifact.data);
    Ok(out)
}

fn decode_record(raw: Bytes) -> Result<DraftArtifact, StorageError> {
    if raw.len() < 8 || &raw[..4] != RECORD_MAGIC {
        return Err(StorageError::Corrupt("missing record magic".to_string()));
    }
    let header_len = u32::from_be_bytes([raw[4], raw[5], raw[6], raw[7]]) as usize;
    let body_start = 8 + header_len;
    if raw.len() < body_start {
        return Err(StorageError::Corrupt("truncated record header".to_string()));
    }
    let header: RecordHeader = serde_json::from_slice(&raw[8..body_start])
        .map_err(|e| StorageError::Corrupt(format!("bad record header: {e}")))?;
    let data = raw.slice(body_start..);
    if header.size != data.len() as u64 {
        return Err(StorageError::Corrupt(format!(
            "expected {} bytes, found {}",
            header.size,
            data.len()
        )));
    }

    Ok(DraftArtifact {
        file_name: header.file_name,
        media_type: header.media_type,
        data,
        saved_at: header.saved_at,
    })
}

fn open_stores() -> &'static Mutex<HashMap<PathBuf, Arc<StoreHandle>>> {
    static OPEN_STORES: OnceLock<Mutex<HashMap<PathBuf, Arc<StoreHandle>>>> = OnceLock::new();
    OPEN_STORES.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Opens (creating or upgrading if needed) the object store under `data_dir`.
/// Returns the already-open handle when this process opened it before.
async fn open_shared(data_dir: &Path) -> Result<Arc<StoreHandle>, StorageError> {
    let db_dir = data_dir.join(DB_NAME);
    let mut stores = open_stores().lock().await;

    tokio::fs::create_dir_all(&db_dir)
        .await
        .map_err(|e| StorageError::unavailable(&db_dir, e))?;
    let db_dir = tokio::fs::canonicalize(&db_dir)
        .await
        .map_err(|e| StorageError::unavailable(&db_dir, e))?;

    if let Some(handle) = stores.get(&db_dir) {
        return Ok(Arc::clone(handle));
    }

    let version_path = db_dir.join(VERSION_FILE);
    let stored_version = match tokio::fs::read_to_string(&version_path).await {
        Ok(raw) => Some(raw.trim().parse::<u32>().map_err(|e| {
            StorageError::unavailable(&db_dir, format!("unreadable schema version: {e}"))
        })?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(StorageError::unavailable(&db_dir, e)),
    };

    if let Some(v) = stored_version {
        if v > DB_VERSION {
            return Err(StorageError::unavailable(
                &db_dir,
                format!("stored schema version {v} is newer than {DB_VERSION}"),
            ));
        }
    }

    let store_dir = db_dir.join(STORE_NAME);
    tokio::fs::create_dir_all(&store_dir)
        .await
        .map_err(|e| StorageError::unavailable(&store_dir, e))?;

    if stored_version != Some(DB_VERSION) {
        tokio::fs::write(&version_path, DB_VERSION.to_string())
            .await
            .map_err(|e| StorageError::unavailable(&version_path, e))?;
        info!(
            "Object store {} upgraded {:?} -> v{DB_VERSION}",
            db_dir.display(),
            stored_version
        );
    }

    let handle = Arc::new(StoreHandle {
        db_dir: db_dir.clone(),
        store_dir,
        version: DB_VERSION,
    });
    stores.insert(db_dir, Arc::clone(&handle));
    info!("Opened object store {}", handle.db_dir.display());
    Ok(handle)
}

/// Async slot holding at most one pending résumé.
///
/// Callers must await each operation before issuing the next; concurrent
/// save/load/clear against the slot are not serialized.
#[async_trait]
pub trait DraftSlot: Send + Sync {
    /// Replaces whatever is stored.
    async fn save(&self, artifact: &DraftArtifact) -> Result<(), StorageError>;

    /// `Ok(None)` when nothing was saved or the slot was cleared.
    async fn load(&self) -> Result<Option<DraftArtifact>, StorageError>;

    /// Idempotent.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// File-backed draft store rooted at the configured data directory.
#[derive(Debug)]
pub struct DraftStore {
    data_dir: PathBuf,
    handle: OnceCell<Arc<StoreHandle>>,
}

impl DraftStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            handle: OnceCell::new(),
        }
    }

    /// Opens the store, creating it on first use. Safe to call repeatedly or concurrently.
    pub async fn initialize(&self) -> Result<Arc<StoreHandle>, StorageError> {
        self.handle
            .get_or_try_init(|| open_shared(&self.data_dir))
            .await
            .map(Arc::clone)
    }
}

#[async_trait]
impl DraftSlot for DraftStore {
    async fn save(&self, artifact: &DraftArtifact) -> Result<(), StorageError> {
        self.initialize().await?.put(artifact).await
    }

    async fn load(&self) -> Result<Option<DraftArtifact>, StorageError> {
        self.initialize().await?.get().await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.initialize().await?.delete().await
    }
}

/// Volatile slot with the same contract, for tests and headless runs.
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    slot: Mutex<Option<DraftArtifact>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DraftSlot for MemoryDraftStore {
    async fn save(&self, artifact: &DraftArtifact) -> Result<(), StorageError> {
        *self.slot.lock().await = Some(artifact.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<DraftArtifact>, StorageError> {
        Ok(self.slot.lock().await.clone())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        *self.slot.lock().await = None;
        Ok(())
    }
}

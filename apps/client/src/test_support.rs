//! Shared helpers for tests that need a live HTTP backend or a misbehaving draft slot.

use async_trait::async_trait;
use axum::Router;

use crate::draft_store::{DraftArtifact, DraftSlot, MemoryDraftStore, StorageError};

/// Serves `router` on an ephemeral localhost port and returns its base URL.
pub async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Draft slot whose `clear` always fails, as on a read-only data directory.
#[derive(Default)]
pub struct ReadOnlyClearDrafts {
    pub inner: MemoryDraftStore,
}

#[async_trait]
impl DraftSlot for ReadOnlyClearDrafts {
    async fn save(&self, artifact: &DraftArtifact) -> Result<(), StorageError> {
        self.inner.save(artifact).await
    }

    async fn load(&self) -> Result<Option<DraftArtifact>, StorageError> {
        self.inner.load().await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        Err(StorageError::Write(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only data directory",
        )))
    }
}

//! Pending résumé flow: stage the file locally, upload it once a session can be created.

use std::path::Path;

use tracing::{info, warn};

use crate::api::{ApiClient, JobApplication, UploadReceipt};
use crate::draft_store::{DraftArtifact, DraftSlot};
use crate::errors::ClientError;

/// Reads `path` and stores it as the pending draft, replacing any earlier one.
pub async fn stage_resume(drafts: &dyn DraftSlot, path: &Path) -> Result<DraftArtifact, ClientError> {
    let artifact = DraftArtifact::from_path(path).await?;
    drafts.save(&artifact).await?;
    info!(
        "Staged résumé '{}' ({} bytes, {})",
        artifact.file_name,
        artifact.data.len(),
        artifact.media_type
    );
    Ok(artifact)
}

/// Uploads the job form together with the staged draft, if any.
///
/// The draft is cleared only after the backend accepts the upload. On failure it stays
/// staged and the error is returned, so the caller cannot move past the upload step.
/// Once the backend has accepted the upload the call succeeds, even if the draft
/// cannot be cleared; resubmitting would create a second session.
pub async fn submit_pending_resume(
    api: &ApiClient,
    drafts: &dyn DraftSlot,
    job: &JobApplication,
) -> Result<UploadReceipt, ClientError> {
    let draft = drafts.load().await?;
    if draft.is_none() && job.resume_text.trim().is_empty() {
        warn!("Submitting job '{}' without a résumé file or text", job.job_name);
    }

    let receipt = api.upload_resume(job, draft.as_ref()).await?;

    if draft.is_some() {
        if let Err(e) = drafts.clear().await {
            warn!("Résumé uploaded but the staged draft was not cleared: {e}");
        }
    }
    info!(
        "Résumé submitted for '{}' (status: {})",
        job.job_name,
        receipt.status.as_deref().unwrap_or("unknown")
    );
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{http::StatusCode, routing::post, Json, Router};
    use bytes::Bytes;
    use serde_json::json;
    use tempfile::TempDir;

    use crate::credentials::MemoryCredentialStore;
    use crate::draft_store::{DraftStore, MemoryDraftStore, StorageError};
    use crate::request::{RequestClient, TransportError};
    use crate::test_support::{spawn_backend, ReadOnlyClearDrafts};
    use axum::extract::State;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const UPLOAD: &str = "/api/interview/upload_resume";

    async fn api_for(router: Router) -> ApiClient {
        let base = spawn_backend(router).await;
        let creds = Arc::new(MemoryCredentialStore::with_token("T"));
        ApiClient::new(RequestClient::new(base, creds.clone()).unwrap(), creds)
    }

    fn job() -> JobApplication {
        JobApplication {
            job_name: "Data Engineer".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_successful_upload_clears_draft() {
        let api = api_for(Router::new().route(
            UPLOAD,
            post(|| async { Json(json!({"message": "ok", "status": "processing"})) }),
        ))
        .await;
        let drafts = MemoryDraftStore::new();
        drafts
            .save(&DraftArtifact::new("cv.pdf", "application/pdf", Bytes::from_static(b"pdf")))
            .await
            .unwrap();

        let receipt = submit_pending_resume(&api, &drafts, &job()).await.unwrap();
        assert_eq!(receipt.status.as_deref(), Some("processing"));
        assert!(drafts.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_accepted_upload_succeeds_when_draft_clear_fails() {
        let hits = Arc::new(AtomicUsize::new(0));
        let api = api_for(
            Router::new()
                .route(
                    UPLOAD,
                    post(|State(hits): State<Arc<AtomicUsize>>| async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        Json(json!({"message": "ok", "status": "processing"}))
                    }),
                )
                .with_state(hits.clone()),
        )
        .await;
        let drafts = ReadOnlyClearDrafts::default();
        drafts
            .save(&DraftArtifact::new("cv.pdf", "application/pdf", Bytes::from_static(b"pdf")))
            .await
            .unwrap();

        let receipt = submit_pending_resume(&api, &drafts, &job()).await.unwrap();
        assert_eq!(receipt.status.as_deref(), Some("processing"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(drafts.load().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_draft() {
        let api = api_for(Router::new().route(
            UPLOAD,
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "disk full") }),
        ))
        .await;
        let drafts = MemoryDraftStore::new();
        drafts
            .save(&DraftArtifact::new("cv.pdf", "application/pdf", Bytes::from_static(b"pdf")))
            .await
            .unwrap();

        let err = submit_pending_resume(&api, &drafts, &job()).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Transport(TransportError::Status { status: 500, .. })
        ));
        assert!(err.is_recoverable());
        assert_eq!(&drafts.load().await.unwrap().unwrap().data[..], b"pdf");
    }

    #[tokio::test]
    async fn test_stage_resume_persists_to_disk() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("resume.docx");
        std::fs::write(&file, b"docx-bytes").unwrap();
        let drafts = DraftStore::new(dir.path().join("data"));

        let staged = stage_resume(&drafts, &file).await.unwrap();
        assert_eq!(staged.file_name, "resume.docx");

        let reopened = DraftStore::new(dir.path().join("data"));
        assert_eq!(&reopened.load().await.unwrap().unwrap().data[..], b"docx-bytes");
    }

    #[tokio::test]
    async fn test_stage_missing_file_is_source_error() {
        let drafts = MemoryDraftStore::new();
        let err = stage_resume(&drafts, Path::new("/definitely/not/here.pdf"))
            .await
            .unwrap_err();
        match err {
            ClientError::Storage(StorageError::Source { path, .. }) => {
                assert_eq!(path, Path::new("/definitely/not/here.pdf"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(drafts.load().await.unwrap().is_none());
    }
}

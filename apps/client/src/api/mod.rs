// Typed wrappers over the backend's HTTP surface.
// Every call goes through RequestClient; nothing here touches reqwest::Client directly.

pub mod envelope;
pub mod models;

use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use reqwest::Url;
use serde_json::Value;
use tracing::info;

use crate::credentials::CredentialStore;
use crate::draft_store::DraftArtifact;
use crate::errors::ClientError;
use crate::request::{RequestClient, TransportError};

pub use envelope::Envelope;
pub use models::*;

const LOGIN: &str = "/api/interviewee/login";
const GET_POSITION: &str = "/api/interviewee/get_position";
const CREATE_RECORD: &str = "/api/interviewee/create_record";
const GET_RECORDS: &str = "/api/interviewee/get_records";
const QUESTIONS: &str = "/api/interviewee/questions";
const GENERATE_REPORT: &str = "/api/interviewee/generate_report";
const UPLOAD_RESUME: &str = "/api/interview/upload_resume";
const SESSION_STATUS: &str = "/interview/session";
const HISTORY: &str = "/interview/history";
const DOWNLOAD: &str = "/interview/download";

#[derive(Clone)]
pub struct ApiClient {
    request: RequestClient,
    credentials: Arc<dyn CredentialStore>,
}

impl ApiClient {
    pub fn new(request: RequestClient, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            request,
            credentials,
        }
    }

    pub fn request(&self) -> &RequestClient {
        &self.request
    }

    /// POST /api/interviewee/login — stores the returned token on success.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ClientError> {
        let response: LoginResponse = self
            .request
            .post_json(LOGIN, &LoginRequest { username, password })
            .await?;

        if response.code != envelope::CODE_OK {
            return Err(TransportError::Rejected {
                code: response.code,
                message: response.message,
            }
            .into());
        }
        let token = response
            .token()
            .ok_or_else(|| TransportError::Decode("login response carried no token".to_string()))?
            .to_string();

        self.credentials.set(&token)?;
        info!("Logged in as {username}");
        Ok(token)
    }

    /// GET /api/interviewee/get_position
    pub async fn positions(&self) -> Result<Vec<Position>, TransportError> {
        self.request.get(GET_POSITION).await
    }

    /// POST /api/interviewee/create_record
    pub async fn create_record(
        &self,
        position_id: i64,
        interviewer_id: i64,
    ) -> Result<InterviewRecord, TransportError> {
        let params = CreateRecordParams {
            position_id,
            interviewer_id,
        };
        self.request.post_json(CREATE_RECORD, &params).await
    }

    /// GET /api/interviewee/get_records
    pub async fn records(&self) -> Result<Vec<InterviewRecord>, TransportError> {
        self.request.get(GET_RECORDS).await
    }

    /// GET /api/interviewee/questions — enveloped; returns the question list.
    pub async fn survey_questions(&self) -> Result<Vec<SurveyQuestion>, TransportError> {
        let envelope: Envelope<Vec<SurveyQuestion>> = self.request.get(QUESTIONS).await?;
        envelope.into_payload()
    }

    /// GET /api/interviewee/generate_report as the personality report.
    pub async fn character_report(&self) -> Result<CharacterReport, TransportError> {
        self.request.get(GENERATE_REPORT).await
    }

    /// GET /api/interviewee/generate_report as the interview report.
    pub async fn interview_report(&self) -> Result<InterviewReport, TransportError> {
        self.request.get(GENERATE_REPORT).await
    }

    /// POST /api/interview/upload_resume (multipart). The file part is optional.
    pub async fn upload_resume(
        &self,
        job: &JobApplication,
        resume: Option<&DraftArtifact>,
    ) -> Result<UploadReceipt, TransportError> {
        let mut form = Form::new()
            .text("job_name", job.job_name.clone())
            .text("job_desc", job.job_desc.clone())
            .text("company_name", job.company_name.clone())
            .text("company_desc", job.company_desc.clone())
            .text("resume_text", job.resume_text.clone());

        if let Some(artifact) = resume {
            form = form.part("resume_file", file_part(artifact)?);
        }
        self.request.post_multipart(UPLOAD_RESUME, form).await
    }

    /// GET /interview/session/{id}
    pub async fn session_status(&self, session_id: &str) -> Result<Value, TransportError> {
        let url = self.with_segment(SESSION_STATUS, session_id)?;
        self.request.get(&url).await
    }

    /// GET /interview/history/{user_id}
    pub async fn interview_history(&self, user_id: &str) -> Result<Value, TransportError> {
        let url = self.with_segment(HISTORY, user_id)?;
        self.request.get(&url).await
    }

    /// Download link for a recorded interview CSV. Builds the URL only; nothing is sent.
    pub fn record_download_url(&self, filename: &str) -> Result<String, TransportError> {
        self.with_segment(DOWNLOAD, filename)
    }

    /// Absolute URL for `prefix` plus one percent-encoded path segment.
    fn with_segment(&self, prefix: &str, segment: &str) -> Result<String, TransportError> {
        let joined = self.request.url(prefix)?;
        let invalid = |reason: String| TransportError::InvalidUrl {
            url: joined.clone(),
            reason,
        };
        let mut url = Url::parse(&joined).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("base address cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(segment);
        Ok(url.into())
    }
}

fn file_part(artifact: &DraftArtifact) -> Result<Part, TransportError> {
    let mime = artifact
        .media_type
        .parse::<mime_guess::mime::Mime>()
        .unwrap_or(mime_guess::mime::APPLICATION_OCTET_STREAM);
    Part::bytes(artifact.data.to_vec())
        .file_name(artifact.file_name.clone())
        .mime_str(mime.as_ref())
        .map_err(TransportError::Network)
}

/// Fetches the position list for the position picker.
pub async fn fetch_positions(api: &ApiClient) -> Result<Vec<Position>, TransportError> {
    api.positions().await
}

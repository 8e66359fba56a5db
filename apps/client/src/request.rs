//! Request Client — the single call-site for every HTTP interaction with the backend.
//!
//! ARCHITECTURAL RULE: no other module builds a `reqwest::Client` or sends HTTP directly.
//! Authentication, response unwrapping, the timeout and error logging live here only.
//!
//! No retries and no deduplication: one call, at most one send.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{multipart::Form, Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::credentials::CredentialStore;

/// Long enough for résumé uploads, short enough to bound a hang.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid request URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Backend rejected request (code {code}): {message}")]
    Rejected { code: i64, message: String },
}

impl TransportError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, TransportError::Status { status: 401, .. })
    }
}

/// Authenticated HTTP client bound to one base address.
#[derive(Clone)]
pub struct RequestClient {
    http: Client,
    base_url: String,
    timeout: Duration,
    credentials: Arc<dyn CredentialStore>,
    invalidate_on_unauthorized: bool,
}

impl RequestClient {
    pub fn new(
        base_url: impl Into<String>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, TransportError> {
        Self::with_timeout(base_url, credentials, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        credentials: Arc<dyn CredentialStore>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TransportError::Network)?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            timeout,
            credentials,
            invalidate_on_unauthorized: true,
        })
    }

    /// Whether a 401 from the backend clears the stored credential. On by default.
    pub fn invalidate_on_unauthorized(mut self, enabled: bool) -> Self {
        self.invalidate_on_unauthorized = enabled;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        self.send(Method::GET, path, |b| b).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, TransportError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::POST, path, |b| b.json(body)).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, TransportError> {
        self.send(Method::POST, path, |b| b.multipart(form)).await
    }

    /// Joins `path` onto the base address. Absolute URLs pass through untouched.
    pub fn url(&self, path: &str) -> Result<String, TransportError> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(path.to_string());
        }
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(TransportError::InvalidUrl {
                url: path.to_string(),
                reason: "no base address configured for a relative path".to_string(),
            });
        }
        Ok(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        ))
    }

    /// Pre-send hook: attaches `Authorization: Bearer <token>` when a credential exists.
    /// A missing credential is not an error; the backend decides.
    /// Returns the token that was attached, if any.
    fn authorize(&self, builder: RequestBuilder) -> (RequestBuilder, Option<String>) {
        match self.credentials.get() {
            Some(token) => (builder.bearer_auth(&token), Some(token)),
            None => (builder, None),
        }
    }

    async fn send<T, F>(&self, method: Method, path: &str, configure: F) -> Result<T, TransportError>
    where
        T: DeserializeOwned,
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let url = self.url(path)?;
        let (builder, sent_token) =
            self.authorize(configure(self.http.request(method.clone(), url.as_str())));

        debug!("{method} {url}");
        let response = match builder.send().await {
            Ok(r) => r,
            Err(e) => return Err(self.fail(&method, &url, self.classify(e))),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == StatusCode::UNAUTHORIZED {
                self.on_unauthorized(sent_token.as_deref());
            }
            return Err(self.fail(
                &method,
                &url,
                TransportError::Status {
                    status: status.as_u16(),
                    body,
                },
            ));
        }

        let bytes = match response.bytes().await {
            Ok(b) => b,
            Err(e) => return Err(self.fail(&method, &url, self.classify(e))),
        };

        // Post-receive hook: hand the body straight to the caller, transport wrapper dropped.
        let decoded = if bytes.is_empty() {
            serde_json::from_value(serde_json::Value::Null)
        } else {
            serde_json::from_slice(&bytes)
        };
        decoded.map_err(|e| self.fail(&method, &url, TransportError::Decode(e.to_string())))
    }

    fn classify(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Network(e)
        }
    }

    /// Clears the credential only if it is still the one this request carried.
    /// A token stored while the request was in flight is left alone.
    fn on_unauthorized(&self, sent_token: Option<&str>) {
        if !self.invalidate_on_unauthorized {
            return;
        }
        let Some(sent) = sent_token else {
            return;
        };
        if self.credentials.get().as_deref() != Some(sent) {
            debug!("401 for a superseded credential; keeping the current one");
            return;
        }
        if let Err(e) = self.credentials.clear() {
            warn!("Failed to clear credential after 401: {e}");
        } else {
            warn!("Backend answered 401; stored credential cleared");
        }
    }

    /// The one place transport failures are logged. Callers decide on messaging and retries.
    fn fail(&self, method: &Method, url: &str, err: TransportError) -> TransportError {
        error!("Request {method} {url} failed: {err}");
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryCredentialStore;
    use crate::test_support::spawn_backend;
    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode as AxumStatus},
        routing::{get, post},
        Json, Router,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use serde::Deserialize;
    use serde_json::{json, Value};

    async fn echo_auth(headers: HeaderMap) -> Json<Value> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        Json(json!({ "authorization": auth }))
    }

    fn backend() -> Router {
        Router::new()
            .route("/echo", get(echo_auth))
            .route("/api/echo", get(echo_auth).post(echo_auth))
            .route(
                "/unauthorized",
                get(|| async { (AxumStatus::UNAUTHORIZED, "Could not validate credentials") }),
            )
            .route(
                "/broken",
                get(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "boom") }),
            )
            .route("/not-json", get(|| async { "plain text" }))
            .route("/empty", post(|| async { AxumStatus::OK }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            )
    }

    #[derive(Debug, Deserialize)]
    struct Echo {
        authorization: Option<String>,
    }

    #[tokio::test]
    async fn test_bearer_header_attached_when_credential_present() {
        let base = spawn_backend(backend()).await;
        let creds = Arc::new(MemoryCredentialStore::with_token("T"));
        let client = RequestClient::new(base, creds).unwrap();

        let echo: Echo = client.get("/echo").await.unwrap();
        assert_eq!(echo.authorization.as_deref(), Some("Bearer T"));
    }

    #[tokio::test]
    async fn test_no_header_without_credential() {
        let base = spawn_backend(backend()).await;
        let client = RequestClient::new(base, Arc::new(MemoryCredentialStore::new())).unwrap();

        let echo: Echo = client.get("/echo").await.unwrap();
        assert!(echo.authorization.is_none());
    }

    #[tokio::test]
    async fn test_credential_change_applies_to_next_call() {
        let base = spawn_backend(backend()).await;
        let creds = Arc::new(MemoryCredentialStore::new());
        let client = RequestClient::new(base, creds.clone()).unwrap();

        let before: Echo = client.get("/echo").await.unwrap();
        creds.set("fresh").unwrap();
        let after: Echo = client.post_json("/api/echo", &json!({})).await.unwrap();

        assert!(before.authorization.is_none());
        assert_eq!(after.authorization.as_deref(), Some("Bearer fresh"));
    }

    #[tokio::test]
    async fn test_base_path_is_joined_without_double_slash() {
        let base = spawn_backend(backend()).await;
        let client =
            RequestClient::new(format!("{base}/api/"), Arc::new(MemoryCredentialStore::new()))
                .unwrap();

        let echo: Echo = client.get("/echo").await.unwrap();
        assert!(echo.authorization.is_none());
        assert_eq!(client.url("/echo").unwrap(), format!("{base}/api/echo"));
    }

    #[tokio::test]
    async fn test_non_2xx_is_status_error() {
        let base = spawn_backend(backend()).await;
        let client = RequestClient::new(base, Arc::new(MemoryCredentialStore::new())).unwrap();

        let err = client.get::<Value>("/broken").await.unwrap_err();
        match err {
            TransportError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_401_clears_credential() {
        let base = spawn_backend(backend()).await;
        let creds = Arc::new(MemoryCredentialStore::with_token("stale"));
        let client = RequestClient::new(base, creds.clone()).unwrap();

        let err = client.get::<Value>("/unauthorized").await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(creds.get().is_none());
    }

    #[tokio::test]
    async fn test_401_for_superseded_token_keeps_new_credential() {
        let creds = Arc::new(MemoryCredentialStore::with_token("OLD"));
        let rotate = Router::new()
            .route(
                "/rotate",
                get(|State(store): State<Arc<MemoryCredentialStore>>| async move {
                    // The user logs in again while this request is still in flight.
                    store.set("NEW").unwrap();
                    AxumStatus::UNAUTHORIZED
                }),
            )
            .with_state(creds.clone());
        let base = spawn_backend(rotate).await;
        let client = RequestClient::new(base, creds.clone()).unwrap();

        let err = client.get::<Value>("/rotate").await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(creds.get().as_deref(), Some("NEW"));
    }

    #[tokio::test]
    async fn test_failed_calls_are_sent_exactly_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counting = Router::new()
            .route(
                "/fail",
                get(|State(hits): State<Arc<AtomicUsize>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    AxumStatus::INTERNAL_SERVER_ERROR
                }),
            )
            .route(
                "/deny",
                post(|State(hits): State<Arc<AtomicUsize>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    AxumStatus::UNAUTHORIZED
                }),
            )
            .with_state(hits.clone());
        let base = spawn_backend(counting).await;
        let client =
            RequestClient::new(base, Arc::new(MemoryCredentialStore::with_token("T"))).unwrap();

        client.get::<Value>("/fail").await.unwrap_err();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        client.post_json::<_, Value>("/deny", &json!({})).await.unwrap_err();
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        let form = Form::new().text("job_name", "x");
        client.post_multipart::<Value>("/deny", form).await.unwrap_err();
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_401_keeps_credential_when_invalidation_disabled() {
        let base = spawn_backend(backend()).await;
        let creds = Arc::new(MemoryCredentialStore::with_token("stale"));
        let client = RequestClient::new(base, creds.clone())
            .unwrap()
            .invalidate_on_unauthorized(false);

        client.get::<Value>("/unauthorized").await.unwrap_err();
        assert_eq!(creds.get().as_deref(), Some("stale"));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_decode_error() {
        let base = spawn_backend(backend()).await;
        let client = RequestClient::new(base, Arc::new(MemoryCredentialStore::new())).unwrap();

        let err = client.get::<Value>("/not-json").await.unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[tokio::test]
    async fn test_empty_body_decodes_to_unit() {
        let base = spawn_backend(backend()).await;
        let client = RequestClient::new(base, Arc::new(MemoryCredentialStore::new())).unwrap();

        let () = client.post_json("/empty", &json!({})).await.unwrap();
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let base = spawn_backend(backend()).await;
        let client = RequestClient::with_timeout(
            base,
            Arc::new(MemoryCredentialStore::new()),
            Duration::from_millis(200),
        )
        .unwrap();

        let err = client.get::<Value>("/slow").await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout(d) if d == Duration::from_millis(200)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client =
            RequestClient::new(format!("http://{addr}"), Arc::new(MemoryCredentialStore::new()))
                .unwrap();
        let err = client.get::<Value>("/echo").await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }

    #[test]
    fn test_relative_path_without_base_is_invalid() {
        let client = RequestClient::new("", Arc::new(MemoryCredentialStore::new())).unwrap();
        assert!(matches!(
            client.url("/api/interviewee/login"),
            Err(TransportError::InvalidUrl { .. })
        ));
        assert_eq!(
            client.url("http://host:8000/x").unwrap(),
            "http://host:8000/x"
        );
    }
}

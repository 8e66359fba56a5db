//! Endpoint Resolver — derives WebSocket URLs for the real-time channels from the one
//! configured HTTP base address plus the current credential.
//!
//! The resolver only builds URLs. Opening, reconnecting and framing belong to the caller.

use std::sync::Arc;

use reqwest::Url;
use thiserror::Error;

use crate::credentials::CredentialStore;

/// Query value sent when no credential is stored. The backend rejects it.
pub const ABSENT_TOKEN: &str = "null";

#[derive(Debug, Error, PartialEq)]
pub enum EndpointError {
    #[error("API base URL is not configured; real-time channels are unavailable")]
    ConfigurationMissing,

    #[error("API base URL '{url}' is not a valid absolute URL: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("API base URL scheme '{0}' cannot be mapped to a WebSocket scheme")]
    UnsupportedScheme(String),
}

/// A real-time transport purpose. Each maps to a fixed backend sub-path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Interview,
    VideoStream,
}

impl Channel {
    pub fn sub_path(self) -> &'static str {
        match self {
            Channel::Interview => "/interview/ws/interview",
            Channel::VideoStream => "/ws/video_stream",
        }
    }
}

impl std::str::FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "interview" => Ok(Channel::Interview),
            "video" | "video-stream" | "video_stream" => Ok(Channel::VideoStream),
            other => Err(format!("unknown channel '{other}' (expected interview|video)")),
        }
    }
}

/// Pure resolution: `http`→`ws`, `https`→`wss`, host and port kept, one trailing `/`
/// stripped from the base path, channel sub-path appended, token as `?token=`.
pub fn resolve_channel_url(
    base_url: &str,
    channel: Channel,
    token: Option<&str>,
) -> Result<String, EndpointError> {
    let base_url = base_url.trim();
    if base_url.is_empty() {
        return Err(EndpointError::ConfigurationMissing);
    }

    let mut url = Url::parse(base_url).map_err(|e| EndpointError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;

    let ws_scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => return Err(EndpointError::UnsupportedScheme(other.to_string())),
    };
    url.set_scheme(ws_scheme)
        .map_err(|_| EndpointError::UnsupportedScheme(url.scheme().to_string()))?;

    let base_path = url.path();
    let base_path = base_path.strip_suffix('/').unwrap_or(base_path);
    let path = format!("{base_path}{}", channel.sub_path());
    url.set_path(&path);

    // Only origin + path survive; credentials, query and fragment of the base are dropped.
    let _ = url.set_username("");
    let _ = url.set_password(None);
    url.set_fragment(None);
    url.set_query(None);
    url.query_pairs_mut()
        .append_pair("token", token.unwrap_or(ABSENT_TOKEN));

    Ok(url.into())
}

/// Resolver bound to the configured base address and the injected credential store.
#[derive(Clone)]
pub struct EndpointResolver {
    base_url: Option<String>,
    credentials: Arc<dyn CredentialStore>,
}

impl EndpointResolver {
    pub fn new(base_url: Option<String>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            base_url,
            credentials,
        }
    }

    /// Reads the credential fresh on every call.
    pub fn resolve(&self, channel: Channel) -> Result<String, EndpointError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or(EndpointError::ConfigurationMissing)?;
        let token = self.credentials.get();
        resolve_channel_url(base, channel, token.as_deref())
    }

    pub fn interview_url(&self) -> Result<String, EndpointError> {
        self.resolve(Channel::Interview)
    }

    pub fn video_url(&self) -> Result<String, EndpointError> {
        self.resolve(Channel::VideoStream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryCredentialStore;

    #[test]
    fn test_https_base_with_trailing_slash() {
        let url = resolve_channel_url("https://api.example.com/app/", Channel::Interview, Some("T"))
            .unwrap();
        assert_eq!(url, "wss://api.example.com/app/interview/ws/interview?token=T");

        let url =
            resolve_channel_url("https://api.example.com/app/", Channel::VideoStream, Some("T"))
                .unwrap();
        assert_eq!(url, "wss://api.example.com/app/ws/video_stream?token=T");
    }

    #[test]
    fn test_base_without_trailing_slash() {
        let url =
            resolve_channel_url("https://api.example.com/app", Channel::Interview, Some("T")).unwrap();
        assert_eq!(url, "wss://api.example.com/app/interview/ws/interview?token=T");
    }

    #[test]
    fn test_root_base_and_nonstandard_port() {
        let url = resolve_channel_url("http://localhost:8000", Channel::VideoStream, Some("abc"))
            .unwrap();
        assert_eq!(url, "ws://localhost:8000/ws/video_stream?token=abc");

        let url = resolve_channel_url("http://10.0.0.2:8000/", Channel::Interview, Some("abc"))
            .unwrap();
        assert_eq!(url, "ws://10.0.0.2:8000/interview/ws/interview?token=abc");
    }

    #[test]
    fn test_only_one_trailing_slash_is_stripped() {
        let url = resolve_channel_url("https://h.example/app//", Channel::VideoStream, Some("T"))
            .unwrap();
        assert_eq!(url, "wss://h.example/app//ws/video_stream?token=T");
    }

    #[test]
    fn test_base_query_and_fragment_dropped() {
        let url = resolve_channel_url(
            "https://user:pw@h.example/app/?x=1#frag",
            Channel::Interview,
            Some("T"),
        )
        .unwrap();
        assert_eq!(url, "wss://h.example/app/interview/ws/interview?token=T");
    }

    #[test]
    fn test_absent_token_uses_marker() {
        let url = resolve_channel_url("http://h.example", Channel::Interview, None).unwrap();
        assert_eq!(url, "ws://h.example/interview/ws/interview?token=null");
    }

    #[test]
    fn test_token_is_query_encoded() {
        let url = resolve_channel_url("http://h.example", Channel::Interview, Some("a b&c")).unwrap();
        assert_eq!(url, "ws://h.example/interview/ws/interview?token=a+b%26c");
    }

    #[test]
    fn test_missing_or_blank_base_is_configuration_missing() {
        assert_eq!(
            resolve_channel_url("", Channel::Interview, Some("T")),
            Err(EndpointError::ConfigurationMissing)
        );
        let resolver = EndpointResolver::new(None, Arc::new(MemoryCredentialStore::with_token("T")));
        assert_eq!(resolver.video_url(), Err(EndpointError::ConfigurationMissing));
    }

    #[test]
    fn test_malformed_and_non_http_bases() {
        assert!(matches!(
            resolve_channel_url("api.example.com/app", Channel::Interview, None),
            Err(EndpointError::InvalidBaseUrl { .. })
        ));
        assert_eq!(
            resolve_channel_url("ftp://h.example", Channel::Interview, None),
            Err(EndpointError::UnsupportedScheme("ftp".to_string()))
        );
    }

    #[test]
    fn test_resolver_reads_credential_per_call() {
        let creds = Arc::new(MemoryCredentialStore::new());
        let resolver = EndpointResolver::new(Some("https://h.example/".to_string()), creds.clone());

        assert!(resolver.interview_url().unwrap().ends_with("token=null"));
        creds.set("T2").unwrap();
        assert_eq!(
            resolver.interview_url().unwrap(),
            "wss://h.example/interview/ws/interview?token=T2"
        );
    }

    #[test]
    fn test_channel_from_str() {
        assert_eq!("interview".parse::<Channel>(), Ok(Channel::Interview));
        assert_eq!("video".parse::<Channel>(), Ok(Channel::VideoStream));
        assert!("audio".parse::<Channel>().is_err());
    }
}

use serde::{Deserialize, Serialize};

use crate::request::TransportError;

/// Backend status code meaning success inside an envelope.
pub const CODE_OK: i64 = 200;

/// The uniform `{code, message, data}` wrapper some endpoints return.
/// Older handlers spell the message field `msg`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default, alias = "msg")]
    pub message: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }

    /// Unwraps the payload. A non-success code becomes `Rejected`, a missing payload `Decode`.
    pub fn into_payload(self) -> Result<T, TransportError> {
        if !self.is_ok() {
            return Err(TransportError::Rejected {
                code: self.code,
                message: self.message,
            });
        }
        self.data
            .ok_or_else(|| TransportError::Decode("envelope carried no data".to_string()))
    }
}

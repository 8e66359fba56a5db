use thiserror::Error;

use crate::credentials::CredentialError;
use crate::draft_store::StorageError;
use crate::endpoint::EndpointError;
use crate::request::TransportError;

/// Crate-level error. Each variant wraps the error of the layer that produced it.
///
/// `ConfigurationMissing` surfaces as `Endpoint(EndpointError::ConfigurationMissing)`.
/// Unauthenticated access is not an error at all; the navigation guard redirects.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Endpoint error: {0}")]
    Endpoint(#[from] EndpointError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),
}

impl ClientError {
    /// Fatal for any screen that needs real-time transport.
    pub fn is_configuration_missing(&self) -> bool {
        matches!(
            self,
            ClientError::Endpoint(EndpointError::ConfigurationMissing)
        )
    }

    /// Worth offering the user a retry: storage and transport failures.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ClientError::Storage(_) | ClientError::Transport(_))
    }
}

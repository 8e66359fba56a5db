//! Client-side session and connectivity layer for the AI interview application.
//!
//! - `draft_store`: durable single-slot storage for the pending résumé
//! - `request`: the authenticated HTTP client every backend call goes through
//! - `endpoint`: WebSocket URL derivation for the interview and video channels
//! - `router`: static route table and the credential-presence navigation guard

pub mod api;
pub mod config;
pub mod credentials;
pub mod draft_store;
pub mod endpoint;
pub mod errors;
pub mod request;
pub mod router;
pub mod session;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use errors::ClientError;
pub use session::Session;

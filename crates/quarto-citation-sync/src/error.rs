//! Error types for quarto-citation-sync

use crate::host::RegionId;
use crate::transport::RequestError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A remote call failed. Never retried here; the caller re-runs the action.
    #[error("{0}")]
    Request(#[from] RequestError),

    #[error("Host document error: {0}")]
    Host(String),

    #[error("Region not found: {0}")]
    RegionNotFound(RegionId),

    #[error("Failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Error {
    /// Create a host error from any message.
    pub fn host(msg: impl Into<String>) -> Self {
        Self::Host(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

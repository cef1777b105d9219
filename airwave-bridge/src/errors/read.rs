use std::time::Duration;

use airwave_api::{DecodeError, Model};

use super::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("Connection failed: {0}")]
    ConnectFailed(#[from] TransportError),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("No protocol available for {0}")]
    UnsupportedModel(Model),
}

impl ReadError {
    /// Error kind published for downstream consumers; every read failure is
    /// reported as a failed connection.
    pub fn kind(&self) -> &'static str {
        "connection-failed"
    }
}

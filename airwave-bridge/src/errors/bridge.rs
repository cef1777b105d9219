use super::{DiscoveryError, TelemetryError};

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Update loop is already running")]
    AlreadyRunning,
}

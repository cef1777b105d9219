/// Failures reported by the peripheral link capability.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to connect to {address}: {reason}")]
    Connect { address: String, reason: String },

    #[error("Failed to read characteristic {handle:#06x}: {reason}")]
    Characteristic { handle: u16, reason: String },

    #[error("Scan failed: {0}")]
    Scan(String),
}

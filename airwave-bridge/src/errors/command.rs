#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Invalid command payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("Command has no method")]
    MissingMethod,

    #[error("Invalid devices parameter: {0}")]
    InvalidDevices(String),
}

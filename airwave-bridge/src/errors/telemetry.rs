use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Broker connection failed: {0}")]
    Connection(#[from] rumqttc::ConnectionError),

    #[error("Broker did not acknowledge the connection within {0:?}")]
    ConnectTimeout(Duration),

    #[error("Client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

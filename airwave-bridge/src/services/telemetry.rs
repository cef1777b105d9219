use std::sync::Arc;

use airwave_api::Sample;
use async_trait::async_trait;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, error, info};

pub use rumqttc::QoS;

use crate::configs::Gateway;
use crate::errors::TelemetryError;
use crate::services::ReadOutcome;

/// Outbound side of the message broker.
#[async_trait]
pub trait Telemetry: Send + Sync {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        qos: QoS,
        retain: bool,
    ) -> Result<(), TelemetryError>;
}

#[derive(Debug, Serialize)]
struct SampleMessage<'a> {
    #[serde(flatten)]
    sample: &'a Sample,
    model_name: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    expires_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
struct ErrorMessage<'a> {
    error: &'a str,
    message: String,
}

/// Turns read outcomes into device topic messages.
pub struct SamplePublisher {
    telemetry: Arc<dyn Telemetry>,
    gateway: Gateway,
}

impl SamplePublisher {
    pub fn new(telemetry: Arc<dyn Telemetry>, gateway: Gateway) -> Self {
        Self { telemetry, gateway }
    }

    /// Publish one message per outcome. Samples are retained so late
    /// subscribers see the last reading until `expires_at`; errors are not.
    /// A failed publish is logged and does not stop the others.
    pub async fn publish(&self, outcomes: &[ReadOutcome], expires_at: OffsetDateTime) {
        info!("Publishing {} outcome(s)", outcomes.len());

        for outcome in outcomes {
            let serial_number = outcome.device.serial_number();
            let published = match &outcome.result {
                Ok(sample) => {
                    let message = SampleMessage {
                        sample,
                        model_name: outcome.device.model().model_name(),
                        expires_at,
                    };
                    let topic = self.gateway.device_topic(serial_number, "sample");
                    self.send(&topic, &message, QoS::AtLeastOnce, true).await
                }
                Err(e) => {
                    let message = ErrorMessage {
                        error: e.kind(),
                        message: e.to_string(),
                    };
                    let topic = self.gateway.device_topic(serial_number, "error");
                    self.send(&topic, &message, QoS::AtMostOnce, false).await
                }
            };

            if let Err(e) = published {
                error!("Failed to publish outcome of {}: {}", outcome.device, e);
            }
        }
    }

    async fn send<T: Serialize + Sync>(
        &self,
        topic: &str,
        message: &T,
        qos: QoS,
        retain: bool,
    ) -> Result<(), TelemetryError> {
        let payload = serde_json::to_vec(message)?;
        debug!("Publishing to {}: {}", topic, String::from_utf8_lossy(&payload));

        self.telemetry.publish(topic, payload, qos, retain).await
    }
}

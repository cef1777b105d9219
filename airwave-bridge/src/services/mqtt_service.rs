use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

use crate::configs::Gateway;
use crate::errors::TelemetryError;
use crate::services::Telemetry;

const COMMAND_QUEUE_SIZE: usize = 16;

#[derive(Clone)]
pub struct MqttService {
    client: AsyncClient,
    command_topic: String,
}

impl MqttService {
    /// Connect to the broker and wait for it to acknowledge the session.
    pub async fn connect(gateway: &Gateway) -> Result<(Self, EventLoop), TelemetryError> {
        let mut options = MqttOptions::new(&gateway.client_id, &gateway.host, gateway.port);
        options.set_keep_alive(Duration::from_secs(gateway.keep_alive_secs));
        if let Some(auth) = &gateway.auth {
            options.set_credentials(&auth.username, &auth.password);
        }

        let (client, mut event_loop) = AsyncClient::new(options, 10);

        info!("Connecting to broker at {}:{}", gateway.host, gateway.port);
        let connected = async {
            loop {
                if let Event::Incoming(Packet::ConnAck(ack)) = event_loop.poll().await? {
                    return Ok::<_, TelemetryError>(ack);
                }
            }
        };
        let ack = tokio::time::timeout(gateway.connect_timeout(), connected)
            .await
            .map_err(|_| TelemetryError::ConnectTimeout(gateway.connect_timeout()))??;
        debug!("Broker acknowledged connection: {:?}", ack);

        Ok((
            Self {
                client,
                command_topic: gateway.command_topic(),
            },
            event_loop,
        ))
    }

    pub async fn subscribe_commands(&self) -> Result<(), TelemetryError> {
        self.client
            .subscribe(&self.command_topic, QoS::AtLeastOnce)
            .await?;
        debug!("Subscribed to {}", self.command_topic);

        Ok(())
    }

    /// Drive the event loop in the background and hand command payloads to
    /// the returned channel.
    ///
    /// Publishing only completes while the event loop is polled, so command
    /// execution must happen elsewhere. Commands arriving while the queue is
    /// full are dropped. The command subscription is renewed after every
    /// reconnect.
    pub fn listen(&self, mut event_loop: EventLoop) -> mpsc::Receiver<Vec<u8>> {
        let (sender, receiver) = mpsc::channel(COMMAND_QUEUE_SIZE);
        let client = self.client.clone();
        let command_topic = self.command_topic.clone();

        tokio::spawn(async move {
            loop {
                match event_loop.poll().await {
                    Ok(Event::Incoming(Packet::Publish(publish)))
                        if publish.topic == command_topic =>
                    {
                        match sender.try_send(publish.payload.to_vec()) {
                            Ok(()) => {}
                            Err(TrySendError::Full(_)) => {
                                warn!("Command queue is full, dropping command")
                            }
                            Err(TrySendError::Closed(_)) => break,
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        debug!("Ignoring message on {}", publish.topic)
                    }
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("Reconnected to broker");
                        if let Err(e) = client.try_subscribe(&command_topic, QoS::AtLeastOnce) {
                            error!("Failed to renew subscription to {}: {}", command_topic, e);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("MQTT error: {}", e);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }

            debug!("MQTT event loop stopped");
        });

        receiver
    }
}

#[async_trait]
impl Telemetry for MqttService {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        qos: QoS,
        retain: bool,
    ) -> Result<(), TelemetryError> {
        self.client.publish(topic, qos, retain, payload).await?;

        Ok(())
    }
}

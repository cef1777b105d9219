use std::sync::Arc;
use std::time::Duration;

use airwave_api::{Device, Sample};
use tracing::{debug, error, warn};

use crate::configs::Reader;
use crate::errors::ReadError;
use crate::services::transport::{Link, Radio};
use crate::services::{Deadline, Elapsed, TimeProvider};

/// Result of reading one device.
#[derive(Debug)]
pub struct ReadOutcome {
    pub device: Device,
    pub result: Result<Sample, ReadError>,
}

pub struct ReaderService {
    radio: Arc<dyn Radio>,
    timeout: Option<Duration>,
    disconnect_timeout: Duration,
    time: Arc<dyn TimeProvider>,
}

impl ReaderService {
    pub fn new(radio: Arc<dyn Radio>, settings: &Reader, time: Arc<dyn TimeProvider>) -> Self {
        Self {
            radio,
            timeout: settings.timeout(),
            disconnect_timeout: settings.disconnect_timeout(),
            time,
        }
    }

    /// Connect, read every characteristic of the device's protocol and decode
    /// them into a sample.
    ///
    /// The whole exchange runs under the read deadline. Once a link has been
    /// opened it is always released, also after a failure or a timeout.
    pub async fn read(&self, device: &Device) -> Result<Sample, ReadError> {
        let protocol = device
            .model()
            .protocol()
            .ok_or(ReadError::UnsupportedModel(device.model()))?;

        let mut link: Option<Box<dyn Link>> = None;
        let result = Deadline::new(self.timeout)
            .run(async {
                debug!("Connecting to {} at {}", device, device.address());
                let link = link.insert(self.radio.connect(device.address()).await?);

                let mut reads = Vec::with_capacity(protocol.characteristics().len());
                for handle in protocol.characteristics() {
                    reads.push(link.read_characteristic(*handle).await?);
                }

                Ok::<_, ReadError>(protocol.decode(&reads, self.time.now())?)
            })
            .await;

        if let Some(mut link) = link {
            self.disconnect(device, link.as_mut()).await;
        }

        match result {
            Ok(result) => result,
            Err(Elapsed(timeout)) => Err(ReadError::Timeout(timeout)),
        }
    }

    /// Read devices one after another. Every device yields exactly one
    /// outcome, in input order.
    pub async fn read_all(&self, devices: &[Device]) -> Vec<ReadOutcome> {
        let mut outcomes = Vec::with_capacity(devices.len());

        for device in devices {
            let result = self.read(device).await;
            match &result {
                Ok(sample) => debug!("Read {}: {}", device, sample),
                Err(ReadError::Timeout(timeout)) => {
                    error!("Timed out after {:?} while reading {}", timeout, device)
                }
                Err(e) => error!("Failed to read {}: {}", device, e),
            }

            outcomes.push(ReadOutcome {
                device: device.clone(),
                result,
            });
        }

        outcomes
    }

    async fn disconnect(&self, device: &Device, link: &mut dyn Link) {
        match tokio::time::timeout(self.disconnect_timeout, link.disconnect()).await {
            Ok(Ok(())) => debug!("Disconnected from {}", device),
            Ok(Err(e)) => warn!("Failed to disconnect from {}: {}", device, e),
            Err(_) => warn!(
                "Timed out after {:?} while disconnecting from {}",
                self.disconnect_timeout, device
            ),
        }
    }
}

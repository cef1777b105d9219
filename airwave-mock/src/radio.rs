use std::time::Duration;

use airwave_api::Model;
use airwave_api::advertisement::AIRTHINGS_MAGIC;
use airwave_api::protocols::Handle;
use airwave_bridge::errors::TransportError;
use airwave_bridge::services::transport::{Advertisement, AdvertisementStream, Link, Radio};
use async_trait::async_trait;
use futures::{StreamExt, stream};
use rand::Rng;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::settings::{Failure, Mock, MockDevice};
use crate::simulate::{Climate, characteristics};

/// Bluetooth radio populated from the `[mock]` configuration section.
pub struct SimulatedRadio {
    devices: Vec<MockDevice>,
    noise: bool,
}

impl SimulatedRadio {
    pub fn new(mock: &Mock) -> Self {
        Self {
            devices: mock.devices.clone(),
            noise: mock.noise,
        }
    }

    fn advertisements(&self) -> Vec<Advertisement> {
        let mut advertisements: Vec<Advertisement> = self
            .devices
            .iter()
            .map(|device| Advertisement {
                address: device.address(),
                connectable: true,
                manufacturer_data: Some(identity(AIRTHINGS_MAGIC, device.serial_number)),
            })
            .collect();

        if self.noise {
            advertisements.extend([
                Advertisement {
                    address: "4C:57:CA:10:20:30".to_string(),
                    connectable: true,
                    manufacturer_data: Some(identity(0x004c, 1_122_334_455)),
                },
                Advertisement {
                    address: "F0:99:19:00:00:01".to_string(),
                    connectable: false,
                    manufacturer_data: None,
                },
            ]);
        }

        advertisements
    }
}

#[async_trait]
impl Radio for SimulatedRadio {
    async fn scan(&self) -> Result<AdvertisementStream, TransportError> {
        let mut advertisements = self.advertisements();
        let delays: Vec<Duration> = {
            let mut rng = rand::rng();
            advertisements
                .iter()
                .map(|_| Duration::from_millis(rng.random_range(50..1_500)))
                .collect()
        };
        advertisements.reverse();

        info!("Simulating scan over {} peripheral(s)", advertisements.len());

        // peripherals keep advertising; the scan only ends when its consumer stops
        Ok(stream::iter(delays)
            .then(move |delay| {
                let advertisement = advertisements.pop();
                async move {
                    tokio::time::sleep(delay).await;
                    advertisement
                }
            })
            .filter_map(|advertisement| async move { advertisement.map(Ok::<_, TransportError>) })
            .chain(stream::pending())
            .boxed())
    }

    async fn connect(&self, address: &str) -> Result<Box<dyn Link>, TransportError> {
        let device = self
            .devices
            .iter()
            .find(|device| device.address() == address)
            .ok_or_else(|| TransportError::Connect {
                address: address.to_string(),
                reason: "no such peripheral".to_string(),
            })?;

        tokio::time::sleep(Duration::from_millis(300)).await;

        if device.fail == Some(Failure::Connect) {
            return Err(TransportError::Connect {
                address: address.to_string(),
                reason: "connection refused".to_string(),
            });
        }

        let model = Model::from_serial_number(&device.serial_number.to_string()).map_err(|e| {
            TransportError::Connect {
                address: address.to_string(),
                reason: e.to_string(),
            }
        })?;

        debug!("Simulated link to {} open", address);
        Ok(Box::new(SimulatedLink {
            model,
            climate: Climate::at(OffsetDateTime::now_utc(), &mut rand::rng()),
            fail: device.fail,
        }))
    }
}

struct SimulatedLink {
    model: Model,
    climate: Climate,
    fail: Option<Failure>,
}

#[async_trait]
impl Link for SimulatedLink {
    async fn read_characteristic(&mut self, handle: Handle) -> Result<Vec<u8>, TransportError> {
        tokio::time::sleep(Duration::from_millis(100)).await;

        match self.fail {
            Some(Failure::Hang) => std::future::pending().await,
            Some(Failure::Garbage) => Ok(vec![0xff]),
            _ => characteristics(self.model, &self.climate)
                .remove(&handle)
                .ok_or_else(|| TransportError::Characteristic {
                    handle,
                    reason: "not supported by this model".to_string(),
                }),
        }
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        debug!("Simulated link to {} closed", self.model);
        Ok(())
    }
}

fn identity(magic: u16, serial_number: u32) -> Vec<u8> {
    let mut data = magic.to_le_bytes().to_vec();
    data.extend_from_slice(&serial_number.to_le_bytes());
    data
}

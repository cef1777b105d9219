use std::collections::HashSet;
use std::sync::Arc;

use airwave_api::{Device, IdentityError, advertisement};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

use crate::configs::Discovery;
use crate::errors::DiscoveryError;
use crate::models::Registry;
use crate::services::transport::Radio;

pub struct DiscoveryService {
    radio: Arc<dyn Radio>,
    registry: Arc<Registry>,
    settings: Discovery,
    /// Serializes scans, and the registry swap that follows one
    scan_lock: Mutex<()>,
}

impl DiscoveryService {
    pub fn new(radio: Arc<dyn Radio>, registry: Arc<Registry>, settings: Discovery) -> Self {
        Self {
            radio,
            registry,
            settings,
            scan_lock: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Scan for Airthings devices without touching the registry.
    pub async fn scan(&self) -> Result<Vec<Device>, DiscoveryError> {
        let _scanning = self.scan_lock.lock().await;

        self.scan_devices().await
    }

    /// Scan and replace the registry with what was found, even when nothing
    /// was found. A failed scan leaves the registry untouched.
    pub async fn discover(&self) -> Result<Arc<[Device]>, DiscoveryError> {
        let _scanning = self.scan_lock.lock().await;

        let devices = self.scan_devices().await?;
        if devices.is_empty() {
            warn!("No Airthings devices found");
        }

        let previous = self.registry.replace(devices);
        let current = self.registry.snapshot();
        log_changes(&previous, &current);

        Ok(current)
    }

    /// Discover until at least one device is known.
    ///
    /// An empty scan result is retried after `retry_delay` indefinitely. Only
    /// failed scans count towards `max_fail_streak`, and a successful scan
    /// resets the streak.
    pub async fn discover_until_found(&self) -> Result<Arc<[Device]>, DiscoveryError> {
        let max_fail_streak = self.settings.max_fail_streak.max(1);
        let mut fail_streak = 0;

        info!("Waiting until devices are discovered");
        loop {
            match self.discover().await {
                Ok(_) => fail_streak = 0,
                Err(e) => {
                    fail_streak += 1;
                    if fail_streak >= max_fail_streak {
                        error!("Discovery failed {} time(s) in a row, giving up", fail_streak);
                        return Err(DiscoveryError::Exhausted {
                            attempts: fail_streak,
                            source: Box::new(e),
                        });
                    }
                    warn!(
                        "Discovery failed ({}/{}): {}",
                        fail_streak, max_fail_streak, e
                    );
                }
            }

            let devices = self.registry.snapshot();
            if !devices.is_empty() {
                return Ok(devices);
            }

            info!("Retrying discovery in {:?}", self.settings.retry_delay());
            tokio::time::sleep(self.settings.retry_delay()).await;
        }
    }

    async fn scan_devices(&self) -> Result<Vec<Device>, DiscoveryError> {
        let quiet_period = self.settings.quiet_period();
        let stop_at = Instant::now() + self.settings.max_scan();

        debug!("Scanning for devices");
        let mut advertisements = self.radio.scan().await?;
        let mut seen = HashSet::new();
        let mut devices = Vec::new();
        let mut quiet_until = Instant::now() + quiet_period;

        loop {
            let next = tokio::time::timeout_at(quiet_until.min(stop_at), advertisements.next());
            let advertisement = match next.await {
                Ok(Some(advertisement)) => advertisement?,
                Ok(None) | Err(_) => break,
            };

            if !advertisement.connectable {
                continue;
            }
            let Some(data) = advertisement.manufacturer_data.as_deref() else {
                continue;
            };
            if !seen.insert(advertisement.address.clone()) {
                continue;
            }

            match advertisement::identify(&advertisement.address, data) {
                Ok(device) => {
                    debug!("Found {} at {}", device, device.address());
                    if !devices.contains(&device) {
                        devices.push(device);
                    }
                    quiet_until = Instant::now() + quiet_period;
                }
                Err(IdentityError::NotRecognized) => {
                    trace!("Ignoring non-Airthings device at {}", advertisement.address)
                }
                Err(e) => warn!(
                    "Ignoring Airthings device at {}: {}",
                    advertisement.address, e
                ),
            }
        }

        debug!("Scan finished, {} device(s) found", devices.len());
        Ok(devices)
    }
}

fn log_changes(previous: &[Device], current: &[Device]) {
    for device in current.iter().filter(|device| !previous.contains(device)) {
        info!("Discovered new device {} at {}", device, device.address());
    }
    for device in previous.iter().filter(|device| !current.contains(device)) {
        warn!("Device {} at {} is no longer visible", device, device.address());
    }
}

use std::sync::{Arc, PoisonError, RwLock};

use airwave_api::Device;

/// The set of devices found by the latest discovery.
///
/// Readers take an immutable snapshot; discovery swaps in a whole new snapshot,
/// so an in-flight read never observes a half-updated set.
#[derive(Debug)]
pub struct Registry {
    devices: RwLock<Arc<[Device]>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            devices: RwLock::new(Arc::from(Vec::new())),
        }
    }

    pub fn snapshot(&self) -> Arc<[Device]> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install `devices` as the current snapshot and return the previous one.
    pub fn replace(&self, devices: Vec<Device>) -> Arc<[Device]> {
        let mut current = self.devices.write().unwrap_or_else(PoisonError::into_inner);

        std::mem::replace(&mut *current, Arc::from(devices))
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(serial_number: &str) -> Device {
        Device::new(serial_number, format!("AA:BB:CC:00:00:{}", &serial_number[8..])).unwrap()
    }

    #[test]
    fn test_snapshot_survives_replacement() {
        let registry = Registry::new();
        assert!(registry.is_empty());

        registry.replace(vec![device("2930000001"), device("2930000002")]);
        let snapshot = registry.snapshot();

        let previous = registry.replace(vec![device("2900000003")]);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(previous.len(), 2);
        assert_eq!(registry.snapshot().len(), 1);
        assert_eq!(registry.snapshot()[0].serial_number(), "2900000003");
    }
}

use airwave_bridge::configs::Settings as BridgeSettings;
use airwave_bridge::errors::BridgeError;
use serde::{Deserialize, Serialize};

/// Ways a simulated device can misbehave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Failure {
    /// Refuses every connection
    Connect,
    /// Accepts the connection, never answers a read
    Hang,
    /// Answers with truncated readings
    Garbage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockDevice {
    pub serial_number: u32,
    pub address: Option<String>,
    pub fail: Option<Failure>,
}

impl MockDevice {
    pub fn address(&self) -> String {
        self.address.clone().unwrap_or_else(|| {
            let bytes = self.serial_number.to_be_bytes();
            format!(
                "A4:DA:{:02X}:{:02X}:{:02X}:{:02X}",
                bytes[0], bytes[1], bytes[2], bytes[3]
            )
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Mock {
    /// Also advertise foreign and non-connectable peripherals
    pub noise: bool,
    pub devices: Vec<MockDevice>,
}

impl Default for Mock {
    fn default() -> Self {
        Self {
            noise: true,
            devices: vec![
                MockDevice {
                    serial_number: 2_930_012_345,
                    address: None,
                    fail: None,
                },
                MockDevice {
                    serial_number: 2_900_054_321,
                    address: None,
                    fail: None,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(flatten)]
    pub bridge: BridgeSettings,
    #[serde(default)]
    pub mock: Mock,
}

impl Settings {
    pub fn new() -> Result<Self, BridgeError> {
        let mut settings: Settings = serde_json::from_value(BridgeSettings::document()?)
            .map_err(|e| BridgeError::Config(e.to_string()))?;
        settings.bridge.apply_env_overrides()?;

        Ok(settings)
    }
}

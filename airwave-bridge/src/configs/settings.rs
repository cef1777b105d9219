use std::path::Path;
use std::time::Duration;
use std::{env, fs};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::BridgeError;

const DEFAULT_CONFIG_PATH: &str = "configs/default.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logger {
    pub level: String,
}

impl Default for Logger {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayAuth {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Gateway {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive_secs: u64,
    pub connect_timeout_secs: u64,
    pub topic_prefix: String,
    pub auth: Option<GatewayAuth>,
}

impl Gateway {
    pub fn command_topic(&self) -> String {
        format!("{}/command", self.topic_prefix)
    }

    pub fn device_topic(&self, serial_number: &str, leaf: &str) -> String {
        format!("{}/device/{}/{}", self.topic_prefix, serial_number, leaf)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for Gateway {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "airthings-wave".to_string(),
            keep_alive_secs: 5,
            connect_timeout_secs: 10,
            topic_prefix: "wave".to_string(),
            auth: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Schedule {
    pub read_interval_secs: u64,
    pub discover_interval_secs: u64,
}

impl Schedule {
    pub fn read_interval(&self) -> Duration {
        Duration::from_secs(self.read_interval_secs)
    }

    pub fn discover_interval(&self) -> Duration {
        Duration::from_secs(self.discover_interval_secs)
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            read_interval_secs: 30 * 60,
            discover_interval_secs: 24 * 60 * 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Discovery {
    /// Scan ends once no new device has shown up for this long
    pub quiet_period_secs: u64,
    /// Hard cap on a single scan
    pub max_scan_secs: u64,
    /// Back-off between attempts that found nothing
    pub retry_delay_secs: u64,
    /// Consecutive scan failures tolerated before giving up
    pub max_fail_streak: u32,
}

impl Discovery {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_secs(self.quiet_period_secs)
    }

    pub fn max_scan(&self) -> Duration {
        Duration::from_secs(self.max_scan_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Default for Discovery {
    fn default() -> Self {
        Self {
            quiet_period_secs: 5,
            max_scan_secs: 30,
            retry_delay_secs: 60,
            max_fail_streak: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Reader {
    /// Budget for connect plus read of one device, 0 disables the deadline
    pub timeout_secs: u64,
    pub disconnect_timeout_secs: u64,
}

impl Reader {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn disconnect_timeout(&self) -> Duration {
        Duration::from_secs(self.disconnect_timeout_secs)
    }
}

impl Default for Reader {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            disconnect_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub logger: Logger,
    pub gateway: Gateway,
    pub schedule: Schedule,
    pub discovery: Discovery,
    pub reader: Reader,
}

impl Settings {
    /// Load `$CONFIG_PATH` (or `configs/default.toml`), overlay
    /// `configs/$RUN_MODE.toml` when present and apply `MQTT_*` overrides.
    pub fn new() -> Result<Self, BridgeError> {
        let mut settings: Settings = serde_json::from_value(Self::document()?)
            .map_err(|e| BridgeError::Config(e.to_string()))?;
        settings.apply_env_overrides()?;

        Ok(settings)
    }

    /// The merged configuration document, before any environment override.
    /// Binaries embedding the bridge read their own sections from it.
    pub fn document() -> Result<Value, BridgeError> {
        let path = env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut document = Self::read_document(Path::new(&path))?;

        if let Ok(run_mode) = env::var("RUN_MODE") {
            let overlay = Path::new(&path).with_file_name(format!("{run_mode}.toml"));
            if overlay.is_file() {
                document = Self::merge(document, Self::read_document(&overlay)?);
            }
        }

        Ok(document)
    }

    pub fn from_toml(source: &str) -> Result<Self, BridgeError> {
        toml::from_str(source).map_err(|e| BridgeError::Config(e.to_string()))
    }

    fn read_document(path: &Path) -> Result<Value, BridgeError> {
        let source = fs::read_to_string(path)
            .map_err(|e| BridgeError::Config(format!("{}: {}", path.display(), e)))?;

        toml::from_str(&source)
            .map_err(|e| BridgeError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Section-wise merge, keys of `right` win, nulls never overwrite.
    pub fn merge(left: Value, right: Value) -> Value {
        match (left, right) {
            (Value::Object(mut left_map), Value::Object(right_map)) => {
                for (key, value) in right_map {
                    if value.is_null() {
                        continue;
                    }

                    if let (Some(Value::Object(section)), Value::Object(overrides)) =
                        (left_map.get_mut(&key), &value)
                    {
                        for (name, setting) in overrides.iter().filter(|(_, v)| !v.is_null()) {
                            section.insert(name.clone(), setting.clone());
                        }
                        continue;
                    }

                    left_map.insert(key, value);
                }

                Value::Object(left_map)
            }
            (left, Value::Null) => left,
            (_, right) => right,
        }
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), BridgeError> {
        if let Ok(host) = env::var("MQTT_HOST") {
            self.gateway.host = host;
        }
        if let Ok(port) = env::var("MQTT_PORT") {
            self.gateway.port = port
                .parse()
                .map_err(|_| BridgeError::Config(format!("invalid MQTT_PORT {port:?}")))?;
        }
        if let Ok(client_id) = env::var("MQTT_CLIENT_ID") {
            self.gateway.client_id = client_id;
        }
        if let (Ok(username), Ok(password)) =
            (env::var("MQTT_USERNAME"), env::var("MQTT_PASSWORD"))
        {
            self.gateway.auth = Some(GatewayAuth { username, password });
        }

        Ok(())
    }
}

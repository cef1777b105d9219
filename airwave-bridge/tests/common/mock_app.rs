use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use airwave_api::advertisement::AIRTHINGS_MAGIC;
use airwave_api::protocols::Handle;
use airwave_bridge::app::App;
use airwave_bridge::configs::Settings;
use airwave_bridge::errors::{TelemetryError, TransportError};
use airwave_bridge::services::transport::{Advertisement, AdvertisementStream, Link, Radio};
use airwave_bridge::services::{QoS, Telemetry, TimeProvider};
use async_trait::async_trait;
use futures::{StreamExt, stream};
use time::OffsetDateTime;
use time::macros::datetime;
use tokio::time::Instant;

/// How a fake peripheral answers a connection.
#[derive(Debug, Clone)]
pub enum Peripheral {
    /// Characteristic values by handle
    Values(HashMap<Handle, Vec<u8>>),
    Unreachable,
    /// Connecting never completes
    HangOnConnect,
    /// Connects, but reading never completes
    HangOnRead,
}

/// One scripted scan.
#[derive(Debug, Clone)]
pub enum Scan {
    Fail,
    /// Advertise then end the scan
    Found(Vec<Advertisement>),
    /// Advertise then stay silent with the scan open
    Lingering(Vec<Advertisement>),
    /// A new Wave Plus every `interval`, forever
    Endless(Duration),
}

#[derive(Default)]
pub struct FakeRadio {
    scans: Mutex<VecDeque<Scan>>,
    fallback: Mutex<Vec<Advertisement>>,
    peripherals: Mutex<HashMap<String, Peripheral>>,
    pub scan_count: AtomicUsize,
    pub connect_count: AtomicUsize,
    pub disconnect_count: Arc<AtomicUsize>,
}

impl FakeRadio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a peripheral that every scan without a script advertises.
    pub fn with_device(self, serial_number: u32, peripheral: Peripheral) -> Self {
        let address = address_of(serial_number);
        self.fallback
            .lock()
            .unwrap()
            .push(advertisement(&address, serial_number));
        self.peripherals.lock().unwrap().insert(address, peripheral);
        self
    }

    pub fn with_scans(self, scans: impl IntoIterator<Item = Scan>) -> Self {
        self.scans.lock().unwrap().extend(scans);
        self
    }

    pub fn set_peripheral(&self, serial_number: u32, peripheral: Peripheral) {
        self.peripherals
            .lock()
            .unwrap()
            .insert(address_of(serial_number), peripheral);
    }
}

#[async_trait]
impl Radio for FakeRadio {
    async fn scan(&self) -> Result<AdvertisementStream, TransportError> {
        self.scan_count.fetch_add(1, Ordering::SeqCst);

        let scan = self.scans.lock().unwrap().pop_front();
        let scan = scan.unwrap_or_else(|| Scan::Found(self.fallback.lock().unwrap().clone()));

        Ok(match scan {
            Scan::Fail => return Err(TransportError::Scan("adapter unavailable".to_string())),
            Scan::Found(advertisements) => stream::iter(advertisements.into_iter().map(Ok)).boxed(),
            Scan::Lingering(advertisements) => stream::iter(advertisements.into_iter().map(Ok))
                .chain(stream::pending())
                .boxed(),
            Scan::Endless(interval) => stream::unfold(1u32, move |n| async move {
                tokio::time::sleep(interval).await;
                let serial_number = 2_930_000_000 + n;
                Some((Ok(advertisement(&address_of(serial_number), serial_number)), n + 1))
            })
            .boxed(),
        })
    }

    async fn connect(&self, address: &str) -> Result<Box<dyn Link>, TransportError> {
        self.connect_count.fetch_add(1, Ordering::SeqCst);

        let peripheral = self.peripherals.lock().unwrap().get(address).cloned();
        match peripheral {
            Some(Peripheral::Values(values)) => Ok(Box::new(FakeLink {
                values: Some(values),
                disconnects: self.disconnect_count.clone(),
            })),
            Some(Peripheral::HangOnRead) => Ok(Box::new(FakeLink {
                values: None,
                disconnects: self.disconnect_count.clone(),
            })),
            Some(Peripheral::HangOnConnect) => std::future::pending().await,
            Some(Peripheral::Unreachable) | None => Err(TransportError::Connect {
                address: address.to_string(),
                reason: "peripheral not responding".to_string(),
            }),
        }
    }
}

struct FakeLink {
    values: Option<HashMap<Handle, Vec<u8>>>,
    disconnects: Arc<AtomicUsize>,
}

#[async_trait]
impl Link for FakeLink {
    async fn read_characteristic(&mut self, handle: Handle) -> Result<Vec<u8>, TransportError> {
        let Some(values) = &self.values else {
            return std::future::pending().await;
        };

        values
            .get(&handle)
            .cloned()
            .ok_or_else(|| TransportError::Characteristic {
                handle,
                reason: "not found".to_string(),
            })
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Published {
    pub topic: String,
    pub payload: serde_json::Value,
    pub qos: QoS,
    pub retain: bool,
}

#[derive(Default)]
pub struct RecordingTelemetry {
    published: Mutex<Vec<Published>>,
}

impl RecordingTelemetry {
    pub fn published(&self) -> Vec<Published> {
        self.published.lock().unwrap().clone()
    }

    pub fn on_topic(&self, topic: &str) -> Vec<Published> {
        self.published()
            .into_iter()
            .filter(|message| message.topic == topic)
            .collect()
    }
}

#[async_trait]
impl Telemetry for RecordingTelemetry {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        qos: QoS,
        retain: bool,
    ) -> Result<(), TelemetryError> {
        self.published.lock().unwrap().push(Published {
            topic: topic.to_string(),
            payload: serde_json::from_slice(&payload)?,
            qos,
            retain,
        });
        Ok(())
    }
}

/// Wall clock driven by the tokio clock, so paused tests stay consistent.
pub struct PausedTime {
    origin: Instant,
    start: OffsetDateTime,
}

impl PausedTime {
    pub const START: OffsetDateTime = datetime!(2024-06-01 08:00 UTC);

    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            start: Self::START,
        }
    }
}

impl TimeProvider for PausedTime {
    fn now(&self) -> OffsetDateTime {
        self.start + self.origin.elapsed()
    }
}

pub struct MockApp {
    pub settings: Settings,
    pub radio: Arc<FakeRadio>,
    pub telemetry: Arc<RecordingTelemetry>,
    pub time: Arc<PausedTime>,
    pub app: Arc<App>,
}

impl MockApp {
    pub fn new(radio: FakeRadio) -> Self {
        Self::with_settings(Settings::default(), radio)
    }

    pub fn with_settings(settings: Settings, radio: FakeRadio) -> Self {
        let radio = Arc::new(radio);
        let telemetry = Arc::new(RecordingTelemetry::default());
        let time = Arc::new(PausedTime::new());
        let app = Arc::new(App::new(
            &settings,
            radio.clone(),
            telemetry.clone(),
            time.clone(),
        ));

        Self {
            settings,
            radio,
            telemetry,
            time,
            app,
        }
    }

    pub fn topic(&self, serial_number: u32, leaf: &str) -> String {
        self.settings
            .gateway
            .device_topic(&serial_number.to_string(), leaf)
    }
}

pub fn address_of(serial_number: u32) -> String {
    let bytes = serial_number.to_be_bytes();
    format!(
        "C0:FF:{:02X}:{:02X}:{:02X}:{:02X}",
        bytes[0], bytes[1], bytes[2], bytes[3]
    )
}

pub fn manufacturer_data(magic: u16, serial_number: u32) -> Vec<u8> {
    let mut data = magic.to_le_bytes().to_vec();
    data.extend_from_slice(&serial_number.to_le_bytes());
    data
}

pub fn advertisement(address: &str, serial_number: u32) -> Advertisement {
    Advertisement {
        address: address.to_string(),
        connectable: true,
        manufacturer_data: Some(manufacturer_data(AIRTHINGS_MAGIC, serial_number)),
    }
}

/// Wave Plus readings: 50% humidity, 23.5 C, 1013 hPa.
pub fn wave_plus() -> Peripheral {
    let mut buffer = vec![0x01, 100, 12, 0x23];
    for value in [45u16, 61, 2350, 50_650, 812, 143] {
        buffer.extend_from_slice(&value.to_le_bytes());
    }
    buffer.extend_from_slice(&[0; 4]);

    Peripheral::Values(HashMap::from([(0x0d, buffer)]))
}

/// First generation Wave readings: 45.5% humidity, -5.25 C.
pub fn wave() -> Peripheral {
    Peripheral::Values(HashMap::from([
        (0x26, 4550u16.to_le_bytes().to_vec()),
        (0x16, 87u16.to_le_bytes().to_vec()),
        (0x1e, 64u16.to_le_bytes().to_vec()),
        (0x22, (-525i16).to_le_bytes().to_vec()),
    ]))
}

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use airwave_api::Device;
use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, info, warn};

use crate::configs::Settings;
use crate::errors::BridgeError;
use crate::models::Registry;
use crate::services::transport::Radio;
use crate::services::{
    CommandDispatcher, CommandHandler, DiscoveryService, Job, ReaderService, SamplePublisher,
    Task, Telemetry, TimeProvider,
};

/// The bridge orchestrator: owns the device registry and the two periodic
/// tasks, and serves commands.
pub struct App {
    inner: Arc<Inner>,
    running: AtomicBool,
}

struct Inner {
    discovery: DiscoveryService,
    reader: ReaderService,
    publisher: SamplePublisher,
    time: Arc<dyn TimeProvider>,
    read_task: Task,
    discover_task: Task,
}

impl App {
    pub fn new(
        settings: &Settings,
        radio: Arc<dyn Radio>,
        telemetry: Arc<dyn Telemetry>,
        time: Arc<dyn TimeProvider>,
    ) -> Self {
        let registry = Arc::new(Registry::new());

        let inner = Arc::new_cyclic(|app: &Weak<Inner>| Inner {
            discovery: DiscoveryService::new(radio.clone(), registry, settings.discovery.clone()),
            reader: ReaderService::new(radio, &settings.reader, time.clone()),
            publisher: SamplePublisher::new(telemetry, settings.gateway.clone()),
            read_task: Task::new(
                "Read Wave",
                settings.schedule.read_interval(),
                job(app, |inner| async move { inner.read_and_publish(None).await }),
                time.clone(),
            ),
            discover_task: Task::new(
                "Discover Wave",
                settings.schedule.discover_interval(),
                job(app, |inner| async move { inner.refresh_registry().await }),
                time.clone(),
            ),
            time,
        });

        Self {
            inner,
            running: AtomicBool::new(false),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        self.inner.discovery.registry()
    }

    pub fn read_task(&self) -> &Task {
        &self.inner.read_task
    }

    pub fn discover_task(&self) -> &Task {
        &self.inner.discover_task
    }

    /// Dispatcher executing commands against this app.
    pub fn dispatcher(&self) -> CommandDispatcher {
        CommandDispatcher::new(self.inner.clone())
    }

    /// Run discovery then a read right away, then keep both tasks on
    /// schedule forever. Fails if the loop is already running.
    pub async fn run(&self) -> Result<(), BridgeError> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(BridgeError::AlreadyRunning);
        }

        info!("Starting update loop");
        self.inner.run_due_tasks().await;

        loop {
            let now = self.inner.time.now();
            let next_run_at = self
                .inner
                .read_task
                .next_run(now)
                .min(self.inner.discover_task.next_run(now));

            let delay = Duration::try_from(next_run_at - now).unwrap_or_default();
            debug!("Sleeping for {:.0?}", delay);
            tokio::time::sleep(delay).await;

            self.inner.run_due_tasks().await;
        }
    }
}

impl Inner {
    async fn run_due_tasks(&self) {
        self.discover_task.maybe_run(self.time.now()).await;
        self.read_task.maybe_run(self.time.now()).await;
    }

    async fn refresh_registry(&self) -> Result<(), BridgeError> {
        self.discovery.discover().await?;

        Ok(())
    }

    /// Read and publish. Without a filter every known device is read, and an
    /// empty registry first blocks on discovery until something is found.
    /// With a filter only known devices with a listed serial number are read.
    async fn read_and_publish(
        &self,
        serial_numbers: Option<&BTreeSet<String>>,
    ) -> Result<(), BridgeError> {
        let mut known = self.discovery.registry().snapshot();

        let devices: Vec<Device> = match serial_numbers {
            None => {
                if known.is_empty() {
                    warn!("No known devices, discovering before reading");
                    known = self.discovery.discover_until_found().await?;
                }
                known.to_vec()
            }
            Some(serial_numbers) => {
                let selected: Vec<Device> = known
                    .iter()
                    .filter(|device| serial_numbers.contains(device.serial_number()))
                    .cloned()
                    .collect();
                if selected.len() < serial_numbers.len() {
                    debug!(
                        "Only {} of {} requested device(s) are known",
                        selected.len(),
                        serial_numbers.len()
                    );
                }
                selected
            }
        };

        let outcomes = self.reader.read_all(&devices).await;
        let expires_at = self.read_task.next_run(self.time.now());
        self.publisher.publish(&outcomes, expires_at).await;

        Ok(())
    }
}

#[async_trait]
impl CommandHandler for Inner {
    async fn discover(&self) -> Result<(), BridgeError> {
        self.discover_task.run_if_idle().await;

        Ok(())
    }

    async fn update(&self, devices: Option<BTreeSet<String>>) -> Result<(), BridgeError> {
        if self.read_task.is_running() {
            info!("Read already in progress, ignoring update");
            return Ok(());
        }

        match devices {
            None => {
                self.read_task.run_if_idle().await;
                Ok(())
            }
            Some(serial_numbers) => self.read_and_publish(Some(&serial_numbers)).await,
        }
    }
}

/// Job calling back into the app without keeping it alive.
fn job<F, Fut>(app: &Weak<Inner>, body: F) -> Job
where
    F: Fn(Arc<Inner>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BridgeError>> + Send + 'static,
{
    let app = app.clone();

    Box::new(move || match app.upgrade() {
        Some(inner) => body(inner).boxed(),
        None => futures::future::ready(Ok(())).boxed(),
    })
}

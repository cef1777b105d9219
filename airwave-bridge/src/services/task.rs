use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use time::OffsetDateTime;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::errors::BridgeError;
use crate::services::TimeProvider;

pub type JobFuture = BoxFuture<'static, Result<(), BridgeError>>;
pub type Job = Box<dyn Fn() -> JobFuture + Send + Sync>;

/// A named job that runs periodically.
///
/// At most one execution of a task is in flight at any time. The next run is
/// scheduled one interval after the previous run *finished*, whether it
/// succeeded, failed or panicked.
pub struct Task {
    name: String,
    interval: Duration,
    job: Job,
    time: Arc<dyn TimeProvider>,
    run_lock: tokio::sync::Mutex<()>,
    next_run_at: Mutex<Option<OffsetDateTime>>,
}

impl Task {
    pub fn new(
        name: impl Into<String>,
        interval: Duration,
        job: Job,
        time: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            name: name.into(),
            interval,
            job,
            time,
            run_lock: tokio::sync::Mutex::new(()),
            next_run_at: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }

    /// Whether the task should run at `now`. A task that never ran is due.
    pub fn is_due(&self, now: OffsetDateTime) -> bool {
        match *self.lock_next_run() {
            Some(next_run_at) => now >= next_run_at,
            None => true,
        }
    }

    /// Next scheduled run. A run that is already due is pushed to
    /// `now + interval`, so the result is always later than `now` and never
    /// moves backwards.
    pub fn next_run(&self, now: OffsetDateTime) -> OffsetDateTime {
        let mut next_run_at = self.lock_next_run();

        match *next_run_at {
            Some(at) if now < at => at,
            _ => {
                let at = now + self.interval;
                *next_run_at = Some(at);
                at
            }
        }
    }

    /// Run now, waiting for any execution in flight to finish first.
    pub async fn run(&self) {
        let _running = self.run_lock.lock().await;
        self.execute().await;
    }

    /// Run now unless an execution is already in flight. Returns whether the
    /// job ran.
    pub async fn run_if_idle(&self) -> bool {
        let Ok(_running) = self.run_lock.try_lock() else {
            debug!("{} is already running", self);
            return false;
        };

        self.execute().await;
        true
    }

    /// Run if due at `now` and idle. Returns whether the job ran.
    pub async fn maybe_run(&self, now: OffsetDateTime) -> bool {
        if !self.is_due(now) {
            return false;
        }

        self.run_if_idle().await
    }

    async fn execute(&self) {
        info!("Running {}", self);
        let started = Instant::now();

        match AssertUnwindSafe((self.job)()).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Error while running {}: {}", self, e),
            Err(panic) => error!("{} panicked: {}", self, panic_message(panic.as_ref())),
        }

        info!("{} finished, took {:.1?}", self, started.elapsed());
        *self.lock_next_run() = Some(self.time.now() + self.interval);
    }

    fn lock_next_run(&self) -> MutexGuard<'_, Option<OffsetDateTime>> {
        self.next_run_at.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} every {:?}>", self.name, self.interval)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("next_run_at", &*self.lock_next_run())
            .finish_non_exhaustive()
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

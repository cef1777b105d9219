use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Deadline of {0:?} elapsed")]
pub struct Elapsed(pub Duration);

/// Hard deadline around one operation.
///
/// Each call races the operation against its own timer. If the timer fires
/// first the operation future is dropped at its current await point and the
/// caller gets [`Elapsed`]. Either way both the operation and the timer are
/// gone when `run` returns. A deadline without a timeout runs the operation
/// unbounded.
///
/// A `Deadline` guards a single operation at a time; nesting `run` calls on
/// the same instance is a bug and panics.
#[derive(Debug)]
pub struct Deadline {
    timeout: Option<Duration>,
    entered: AtomicBool,
}

impl Deadline {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            entered: AtomicBool::new(false),
        }
    }

    pub async fn run<F: Future>(&self, operation: F) -> Result<F::Output, Elapsed> {
        let _entered = self.enter();

        let Some(timeout) = self.timeout else {
            return Ok(operation.await);
        };

        tokio::select! {
            output = operation => Ok(output),
            _ = tokio::time::sleep(timeout) => Err(Elapsed(timeout)),
        }
    }

    fn enter(&self) -> EnteredGuard<'_> {
        let first = self
            .entered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        assert!(first, "deadline entered while already guarding an operation");

        EnteredGuard(&self.entered)
    }
}

struct EnteredGuard<'a>(&'a AtomicBool);

impl Drop for EnteredGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

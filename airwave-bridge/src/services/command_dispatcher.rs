use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::errors::BridgeError;
use crate::models::Command;
use crate::services::panic_message;

/// Operations reachable from the command topic.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn discover(&self) -> Result<(), BridgeError>;

    async fn update(&self, devices: Option<BTreeSet<String>>) -> Result<(), BridgeError>;
}

pub struct CommandDispatcher {
    handler: Arc<dyn CommandHandler>,
}

impl CommandDispatcher {
    pub fn new(handler: Arc<dyn CommandHandler>) -> Self {
        Self { handler }
    }

    /// Decode and execute one command. Nothing a command does can take the
    /// dispatcher down: decode errors, handler errors and panics are logged.
    pub async fn dispatch(&self, payload: &[u8]) {
        let command = match Command::decode(payload) {
            Ok(command) => command,
            Err(e) => {
                warn!(
                    "Dropping invalid command {:?}: {}",
                    String::from_utf8_lossy(payload),
                    e
                );
                return;
            }
        };

        debug!("Executing {:?}", command);
        let execution = match &command {
            Command::Discover => self.handler.discover(),
            Command::Update { devices } => self.handler.update(devices.clone()),
            Command::Unrecognized(method) => {
                warn!("Unknown command method {:?}", method);
                return;
            }
        };

        match AssertUnwindSafe(execution).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("{:?} failed: {}", command, e),
            Err(panic) => error!("{:?} panicked: {}", command, panic_message(panic.as_ref())),
        }
    }

    /// Execute commands one at a time until the sending side closes.
    pub async fn listen(&self, mut commands: mpsc::Receiver<Vec<u8>>) {
        while let Some(payload) = commands.recv().await {
            self.dispatch(&payload).await;
        }

        info!("Command channel closed");
    }
}

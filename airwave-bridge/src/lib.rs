use std::sync::Arc;

use crate::app::App;
use crate::configs::Settings;
use crate::errors::BridgeError;
use crate::services::transport::Radio;
use crate::services::{MqttService, SystemTimeProvider};

pub mod app;
pub mod configs;
pub mod errors;
pub mod models;
pub mod services;

/// Connect to the broker and run the bridge over `radio` until the process
/// stops. Only returns if the broker is unreachable at startup. Discovery and
/// read failures are logged by their tasks and retried on schedule.
pub async fn run(settings: &Arc<Settings>, radio: Arc<dyn Radio>) -> Result<(), BridgeError> {
    let (mqtt, event_loop) = MqttService::connect(&settings.gateway).await?;
    let commands = mqtt.listen(event_loop);
    mqtt.subscribe_commands().await?;

    let app = App::new(settings, radio, Arc::new(mqtt), Arc::new(SystemTimeProvider));

    let dispatcher = app.dispatcher();
    tokio::spawn(async move { dispatcher.listen(commands).await });

    app.run().await
}

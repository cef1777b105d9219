use std::sync::Arc;

use airwave_bridge::errors::BridgeError;
use tracing::info;

use crate::radio::SimulatedRadio;
use crate::settings::Settings;

pub mod radio;
pub mod settings;
pub mod simulate;

/// Run the bridge against simulated devices.
pub async fn run(settings: &Arc<Settings>) -> Result<(), BridgeError> {
    info!(
        "Simulating {} device(s), noise {}",
        settings.mock.devices.len(),
        if settings.mock.noise { "on" } else { "off" }
    );

    let radio = Arc::new(SimulatedRadio::new(&settings.mock));
    let bridge = Arc::new(settings.bridge.clone());

    airwave_bridge::run(&bridge, radio).await
}

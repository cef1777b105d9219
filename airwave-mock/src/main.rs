use std::sync::Arc;

use airwave_mock::run;
use airwave_mock::settings::Settings;

#[tokio::main]
async fn main() {
    let settings = Arc::new(Settings::new().expect("Failed to load settings."));

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let app_name = env!("CARGO_PKG_NAME").replace('-', "_");
            let level = settings.bridge.logger.level.as_str();

            format!("{app_name}={level},airwave_bridge={level}").into()
        }))
        .init();

    tokio::select! {
        result = run(&settings) => {
            if let Err(e) = result {
                tracing::error!("Bridge stopped: {}", e);
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => tracing::info!("Stopping"),
    }
}

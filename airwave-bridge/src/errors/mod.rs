pub mod bridge;
pub mod command;
pub mod discovery;
pub mod read;
pub mod telemetry;
pub mod transport;

pub use bridge::BridgeError;
pub use command::CommandError;
pub use discovery::DiscoveryError;
pub use read::ReadError;
pub use telemetry::TelemetryError;
pub use transport::TransportError;

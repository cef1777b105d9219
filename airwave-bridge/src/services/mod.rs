mod clock;
mod command_dispatcher;
mod deadline;
mod discovery_service;
mod mqtt_service;
mod reader_service;
mod task;
mod telemetry;
pub mod transport;

pub use clock::*;
pub use command_dispatcher::*;
pub use deadline::*;
pub use discovery_service::*;
pub use mqtt_service::*;
pub use reader_service::*;
pub use task::*;
pub use telemetry::*;

mod command;
mod registry;

pub use command::*;
pub use registry::*;

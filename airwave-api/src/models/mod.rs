mod device;
mod sample;

pub use device::*;
pub use sample::*;

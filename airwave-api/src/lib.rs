pub mod advertisement;
pub mod error;
pub mod models;
pub mod protocols;

pub use error::{DecodeError, IdentityError};
pub use models::{Device, Model, Sample};
pub use protocols::Protocol;

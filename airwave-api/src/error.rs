#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Manufacturer data that does not carry the Airthings identity payload
    #[error("Not a recognized device advertisement")]
    NotRecognized,

    /// Identity payload whose serial number prefix maps to no known model
    #[error("Unknown device model for serial number {0}")]
    UnknownModel(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Expected {expected} byte(s) from characteristic {handle:#06x}, got {actual}")]
    Length {
        handle: u16,
        expected: usize,
        actual: usize,
    },

    #[error("Expected {expected} characteristic read(s), got {actual}")]
    MissingReadings { expected: usize, actual: usize },
}

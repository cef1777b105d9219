use std::collections::BTreeSet;

use serde_json::Value;

use crate::errors::CommandError;

/// Control message received on the command topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run discovery now unless it is already running
    Discover,
    /// Read every known device, or only those whose serial number is listed
    Update { devices: Option<BTreeSet<String>> },
    /// Any other method, kept so it can be logged
    Unrecognized(String),
}

impl Command {
    /// Decode `{"method": ..., ...params}`.
    ///
    /// `devices` may be absent, `null`, a single id or a list of ids; ids may
    /// be strings or numbers and are normalized to serial number strings.
    pub fn decode(payload: &[u8]) -> Result<Self, CommandError> {
        let value: Value = serde_json::from_slice(payload)?;
        let method = value
            .get("method")
            .and_then(Value::as_str)
            .ok_or(CommandError::MissingMethod)?;

        match method {
            "discover" => Ok(Command::Discover),
            "update" => Ok(Command::Update {
                devices: Self::serial_numbers(value.get("devices"))?,
            }),
            other => Ok(Command::Unrecognized(other.to_string())),
        }
    }

    fn serial_numbers(devices: Option<&Value>) -> Result<Option<BTreeSet<String>>, CommandError> {
        match devices {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(ids)) => ids
                .iter()
                .map(Self::serial_number)
                .collect::<Result<BTreeSet<_>, _>>()
                .map(Some),
            Some(id) => Ok(Some(BTreeSet::from([Self::serial_number(id)?]))),
        }
    }

    fn serial_number(id: &Value) -> Result<String, CommandError> {
        match id {
            Value::String(serial_number) => Ok(serial_number.clone()),
            Value::Number(serial_number) => Ok(serial_number.to_string()),
            other => Err(CommandError::InvalidDevices(other.to_string())),
        }
    }
}

//! Identity payload carried in the manufacturer specific advertisement data.
//!
//! Layout: little-endian `u16` manufacturer magic followed by a little-endian
//! `u32` serial number. Anything trailing is ignored.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::IdentityError;
use crate::models::Device;

pub const AIRTHINGS_MAGIC: u16 = 0x0334;

const IDENTITY_LEN: usize = 6;

/// Extract the serial number from manufacturer data.
pub fn parse_serial_number(manufacturer_data: &[u8]) -> Result<String, IdentityError> {
    if manufacturer_data.len() < IDENTITY_LEN {
        return Err(IdentityError::NotRecognized);
    }

    let mut reader = Cursor::new(manufacturer_data);
    let magic = reader
        .read_u16::<LittleEndian>()
        .map_err(|_| IdentityError::NotRecognized)?;
    if magic != AIRTHINGS_MAGIC {
        return Err(IdentityError::NotRecognized);
    }

    let serial_number = reader
        .read_u32::<LittleEndian>()
        .map_err(|_| IdentityError::NotRecognized)?;

    Ok(serial_number.to_string())
}

/// Build a device from an advertisement.
///
/// Fails with `NotRecognized` for foreign hardware and `UnknownModel` for an
/// Airthings identity whose model prefix is not supported.
pub fn identify(address: &str, manufacturer_data: &[u8]) -> Result<Device, IdentityError> {
    let serial_number = parse_serial_number(manufacturer_data)?;

    Device::new(serial_number, address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Model;

    fn payload(magic: u16, serial_number: u32) -> Vec<u8> {
        let mut data = magic.to_le_bytes().to_vec();
        data.extend_from_slice(&serial_number.to_le_bytes());
        data
    }

    #[test]
    fn test_identify_known_device() {
        let device = identify("AA:BB:CC:DD:EE:01", &payload(AIRTHINGS_MAGIC, 2930012345)).unwrap();

        assert_eq!(device.serial_number(), "2930012345");
        assert_eq!(device.model(), Model::WavePlus);
        assert_eq!(device.address(), "AA:BB:CC:DD:EE:01");
    }

    #[test]
    fn test_foreign_magic_is_not_recognized() {
        assert_eq!(
            identify("AA:BB:CC:DD:EE:01", &payload(0x004c, 2930012345)),
            Err(IdentityError::NotRecognized)
        );
    }

    #[test]
    fn test_short_payload_is_not_recognized() {
        assert_eq!(parse_serial_number(&[0x34, 0x03, 0x01]), Err(IdentityError::NotRecognized));
        assert_eq!(parse_serial_number(&[]), Err(IdentityError::NotRecognized));
    }

    #[test]
    fn test_unknown_model_prefix() {
        assert_eq!(
            identify("AA:BB:CC:DD:EE:01", &payload(AIRTHINGS_MAGIC, 1234000001)),
            Err(IdentityError::UnknownModel("1234000001".to_string()))
        );
    }

    #[test]
    fn test_trailing_bytes_are_ignored() {
        let mut data = payload(AIRTHINGS_MAGIC, 2900000042);
        data.extend_from_slice(&[0x09, 0x00, 0xff]);

        assert_eq!(parse_serial_number(&data), Ok("2900000042".to_string()));
    }
}

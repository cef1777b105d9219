use byteorder::{ByteOrder, LittleEndian};
use time::OffsetDateTime;

use super::{Handle, expect_len};
use crate::error::DecodeError;
use crate::models::Sample;

const HUMIDITY: Handle = 0x26;
const SHORT_TERM_RADON: Handle = 0x16;
const LONG_TERM_RADON: Handle = 0x1e;
const TEMPERATURE: Handle = 0x22;

/// Every first generation value lives in its own 2 byte characteristic.
const VALUE_LEN: usize = 2;

pub const WAVE_CHARACTERISTICS: [Handle; 4] =
    [HUMIDITY, SHORT_TERM_RADON, LONG_TERM_RADON, TEMPERATURE];

pub(super) fn decode(
    reads: &[Vec<u8>],
    collected_at: OffsetDateTime,
) -> Result<Sample, DecodeError> {
    for (handle, buffer) in WAVE_CHARACTERISTICS.iter().zip(reads) {
        expect_len(*handle, buffer, VALUE_LEN)?;
    }

    let humidity = LittleEndian::read_u16(&reads[0]);
    let short_term_radon = LittleEndian::read_u16(&reads[1]);
    let long_term_radon = LittleEndian::read_u16(&reads[2]);
    let temperature = LittleEndian::read_i16(&reads[3]);

    Ok(Sample {
        humidity: Some(f64::from(humidity) / 100.0),
        short_term_radon: Some(short_term_radon),
        long_term_radon: Some(long_term_radon),
        temperature: Some(f64::from(temperature) / 100.0),
        ..Sample::new(collected_at)
    })
}

use byteorder::{ByteOrder, LittleEndian};
use time::OffsetDateTime;

use super::{Handle, expect_len};
use crate::error::DecodeError;
use crate::models::Sample;

const READINGS: Handle = 0x0d;

pub const WAVE_PLUS_CHARACTERISTICS: [Handle; 1] = [READINGS];

// offset  field
// 0       unused
// 1       humidity * 2                     u8
// 2       light level                      u8
// 3       orientation << 4 | wave count    u8
// 4..6    short term radon                 u16
// 6..8    long term radon                  u16
// 8..10   temperature * 100                i16
// 10..12  pressure * 50                    u16
// 12..14  co2                              u16
// 14..16  voc                              u16
// 16..20  unused
pub const WAVE_PLUS_READINGS_LEN: usize = 20;

const NIBBLE: u8 = 0x0f;

pub(super) fn decode(
    readings: &[u8],
    collected_at: OffsetDateTime,
) -> Result<Sample, DecodeError> {
    expect_len(READINGS, readings, WAVE_PLUS_READINGS_LEN)?;

    let humidity = readings[1];
    let light_level = readings[2];
    let orientation_wave_count = readings[3];
    let short_term_radon = LittleEndian::read_u16(&readings[4..6]);
    let long_term_radon = LittleEndian::read_u16(&readings[6..8]);
    let temperature = LittleEndian::read_i16(&readings[8..10]);
    let pressure = LittleEndian::read_u16(&readings[10..12]);
    let co2 = LittleEndian::read_u16(&readings[12..14]);
    let voc = LittleEndian::read_u16(&readings[14..16]);

    Ok(Sample {
        humidity: Some(f64::from(humidity) / 2.0),
        light_level: Some(light_level),
        orientation: Some((orientation_wave_count >> 4) & NIBBLE),
        wave_count: Some(orientation_wave_count & NIBBLE),
        short_term_radon: Some(short_term_radon),
        long_term_radon: Some(long_term_radon),
        temperature: Some(f64::from(temperature) / 100.0),
        pressure: Some(f64::from(pressure) / 50.0),
        co2: Some(co2),
        voc: Some(voc),
        collected_at,
    })
}

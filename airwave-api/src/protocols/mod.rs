mod wave;
mod wave_plus;

use time::OffsetDateTime;

use crate::error::DecodeError;
use crate::models::Sample;

pub use wave::WAVE_CHARACTERISTICS;
pub use wave_plus::{WAVE_PLUS_CHARACTERISTICS, WAVE_PLUS_READINGS_LEN};

/// GATT attribute handle of a characteristic.
pub type Handle = u16;

/// Wire protocol spoken by one device generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Wave,
    WavePlus,
}

impl Protocol {
    /// Characteristics to read, in the order `decode` expects their values.
    pub fn characteristics(self) -> &'static [Handle] {
        match self {
            Protocol::Wave => &WAVE_CHARACTERISTICS,
            Protocol::WavePlus => &WAVE_PLUS_CHARACTERISTICS,
        }
    }

    /// Decode raw characteristic values into a sample stamped `collected_at`.
    pub fn decode(
        self,
        reads: &[Vec<u8>],
        collected_at: OffsetDateTime,
    ) -> Result<Sample, DecodeError> {
        let expected = self.characteristics().len();
        if reads.len() != expected {
            return Err(DecodeError::MissingReadings {
                expected,
                actual: reads.len(),
            });
        }

        match self {
            Protocol::Wave => wave::decode(reads, collected_at),
            Protocol::WavePlus => wave_plus::decode(&reads[0], collected_at),
        }
    }
}

pub(crate) fn expect_len(
    handle: Handle,
    buffer: &[u8],
    expected: usize,
) -> Result<(), DecodeError> {
    if buffer.len() != expected {
        return Err(DecodeError::Length {
            handle,
            expected,
            actual: buffer.len(),
        });
    }

    Ok(())
}

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One normalized set of readings taken from a single device.
///
/// Every measurement is optional: a generation that does not measure a quantity
/// leaves it unset, and unset fields are omitted from the serialized form rather
/// than written as `null` or zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Relative humidity in percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    /// Ambient light level, raw sensor units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_level: Option<u8>,
    /// Device orientation reported by the accelerometer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<u8>,
    /// Number of waves detected in front of the device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wave_count: Option<u8>,
    /// Short term radon average in Bq/m3
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_term_radon: Option<u16>,
    /// Long term radon average in Bq/m3
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_term_radon: Option<u16>,
    /// Temperature in Celsius
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Air pressure in hPa
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    /// CO2 concentration in ppm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co2: Option<u16>,
    /// Volatile organic compounds in ppb
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voc: Option<u16>,
    /// Completion time of the read that produced this sample
    #[serde(with = "time::serde::rfc3339")]
    pub collected_at: OffsetDateTime,
}

impl Sample {
    pub fn new(collected_at: OffsetDateTime) -> Self {
        Self {
            humidity: None,
            light_level: None,
            orientation: None,
            wave_count: None,
            short_term_radon: None,
            long_term_radon: None,
            temperature: None,
            pressure: None,
            co2: None,
            voc: None,
            collected_at,
        }
    }

    fn present_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();

        macro_rules! push_present {
            ($($field:ident),*) => {
                $(
                    if let Some(value) = self.$field {
                        fields.push((stringify!($field), value.to_string()));
                    }
                )*
            };
        }

        push_present!(
            humidity,
            light_level,
            orientation,
            wave_count,
            short_term_radon,
            long_term_radon,
            temperature,
            pressure,
            co2,
            voc
        );

        fields
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self
            .present_fields()
            .into_iter()
            .map(|(name, value)| format!("{name} = {value}"))
            .collect::<Vec<_>>()
            .join(", ");

        write!(f, "Sample({fields})")
    }
}

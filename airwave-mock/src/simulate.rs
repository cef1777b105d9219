use std::collections::HashMap;
use std::f64::consts::PI;

use airwave_api::protocols::{
    Handle, WAVE_CHARACTERISTICS, WAVE_PLUS_CHARACTERISTICS, WAVE_PLUS_READINGS_LEN,
};
use airwave_api::{Model, Protocol};
use byteorder::{ByteOrder, LittleEndian};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use time::OffsetDateTime;

/// Environment of a simulated room at one moment.
#[derive(Debug, Clone, PartialEq)]
pub struct Climate {
    pub humidity: f64,
    pub light_level: u8,
    pub short_term_radon: u16,
    pub long_term_radon: u16,
    pub temperature: f64,
    pub pressure: f64,
    pub co2: u16,
    pub voc: u16,
}

impl Climate {
    /// Daily cycle: warm and dry in the afternoon, CO2 builds up overnight.
    pub fn at(moment: OffsetDateTime, rng: &mut impl Rng) -> Self {
        let day_fraction = f64::from(moment.time().hour()) / 24.0
            + f64::from(moment.time().minute()) / 1_440.0
            + f64::from(moment.time().second()) / 86_400.0;
        let radians = day_fraction * 2.0 * PI;

        let mut jitter = |scale: f64| {
            let noise: f64 = StandardNormal.sample(rng);
            noise * scale
        };

        let temperature = 21.0 - 2.5 * radians.cos() + jitter(0.1);
        let humidity = (45.0 + 10.0 * radians.cos() + jitter(0.5)).clamp(0.0, 100.0);
        let light = (radians - PI / 2.0).sin().max(0.0) * 200.0 + jitter(2.0).abs();
        let co2 = 650.0 + 250.0 * radians.cos() + jitter(15.0);
        let voc = 120.0 + 60.0 * radians.cos() + jitter(8.0);
        let short_term_radon = 40.0 + jitter(6.0);

        Self {
            humidity,
            light_level: light.clamp(0.0, 255.0) as u8,
            short_term_radon: short_term_radon.max(0.0) as u16,
            long_term_radon: 38,
            temperature,
            pressure: 1013.25 + jitter(0.8),
            co2: co2.max(400.0) as u16,
            voc: voc.max(0.0) as u16,
        }
    }
}

/// Characteristic values a device of `model` would serve for `climate`.
pub fn characteristics(model: Model, climate: &Climate) -> HashMap<Handle, Vec<u8>> {
    match model.protocol() {
        Some(Protocol::Wave) => wave(climate),
        Some(Protocol::WavePlus) => wave_plus(climate),
        None => HashMap::new(),
    }
}

fn wave(climate: &Climate) -> HashMap<Handle, Vec<u8>> {
    let values = [
        (climate.humidity * 100.0).round() as u16,
        climate.short_term_radon,
        climate.long_term_radon,
        (climate.temperature * 100.0).round() as i16 as u16,
    ];

    WAVE_CHARACTERISTICS
        .iter()
        .zip(values)
        .map(|(handle, value)| (*handle, value.to_le_bytes().to_vec()))
        .collect()
}

fn wave_plus(climate: &Climate) -> HashMap<Handle, Vec<u8>> {
    let mut buffer = vec![0u8; WAVE_PLUS_READINGS_LEN];

    buffer[0] = 1;
    buffer[1] = (climate.humidity * 2.0).round() as u8;
    buffer[2] = climate.light_level;
    // mounted on the wall, no waves counted
    buffer[3] = 0x20;
    LittleEndian::write_u16(&mut buffer[4..6], climate.short_term_radon);
    LittleEndian::write_u16(&mut buffer[6..8], climate.long_term_radon);
    LittleEndian::write_i16(&mut buffer[8..10], (climate.temperature * 100.0).round() as i16);
    LittleEndian::write_u16(&mut buffer[10..12], (climate.pressure * 50.0).round() as u16);
    LittleEndian::write_u16(&mut buffer[12..14], climate.co2);
    LittleEndian::write_u16(&mut buffer[14..16], climate.voc);

    HashMap::from([(WAVE_PLUS_CHARACTERISTICS[0], buffer)])
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn afternoon() -> Climate {
        Climate::at(datetime!(2024-06-01 14:30 UTC), &mut rand::rng())
    }

    #[test]
    fn test_wave_plus_characteristics_decode() {
        let climate = afternoon();
        let values = characteristics(Model::WavePlus, &climate);
        let reads: Vec<Vec<u8>> = WAVE_PLUS_CHARACTERISTICS
            .iter()
            .map(|handle| values[handle].clone())
            .collect();

        let sample = Protocol::WavePlus
            .decode(&reads, datetime!(2024-06-01 14:30 UTC))
            .unwrap();

        assert!((sample.temperature.unwrap() - climate.temperature).abs() < 0.01);
        assert!((sample.pressure.unwrap() - climate.pressure).abs() < 0.02);
        assert_eq!(sample.co2, Some(climate.co2));
        assert_eq!(sample.orientation, Some(2));
        assert_eq!(sample.wave_count, Some(0));
    }

    #[test]
    fn test_wave_characteristics_decode() {
        let climate = afternoon();
        let values = characteristics(Model::Wave, &climate);
        let reads: Vec<Vec<u8>> = WAVE_CHARACTERISTICS
            .iter()
            .map(|handle| values[handle].clone())
            .collect();

        let sample = Protocol::Wave
            .decode(&reads, datetime!(2024-06-01 14:30 UTC))
            .unwrap();

        assert!((sample.humidity.unwrap() - climate.humidity).abs() < 0.01);
        assert_eq!(sample.long_term_radon, Some(38));
        assert_eq!(sample.co2, None);
    }

    #[test]
    fn test_unreadable_models_serve_nothing() {
        assert!(characteristics(Model::WaveMini, &afternoon()).is_empty());
    }

    #[test]
    fn test_afternoon_is_warmer_than_night() {
        let mut rng = rand::rng();
        let night = Climate::at(datetime!(2024-06-01 02:00 UTC), &mut rng);
        let day = Climate::at(datetime!(2024-06-01 14:00 UTC), &mut rng);

        assert!(day.temperature > night.temperature);
        assert!(day.co2 < night.co2);
    }
}

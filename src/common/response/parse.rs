// src/common/response/parse.rs

use arrayvec::ArrayVec;

use super::data::{FirmwareVersion, Measurement};
use crate::common::crc::{verify_word, WORD_WITH_CRC_LEN};
use crate::common::error::ProtocolError;
use crate::common::units::{Concentration, RelativeHumidity, Temperature};

/// Most words any response carries (read measurement).
pub const MAX_RESPONSE_WORDS: usize = 6;

pub type Words = ArrayVec<u16, MAX_RESPONSE_WORDS>;

// --- Internal Helpers ---
#[inline]
fn float_from_words(high: u16, low: u16) -> f32 {
    f32::from_bits((u32::from(high) << 16) | u32::from(low))
}

fn finite(value: f32, field: &'static str) -> Result<f64, ProtocolError> {
    if value.is_finite() {
        Ok(f64::from(value))
    } else {
        Err(ProtocolError::InvalidValue { field })
    }
}

// --- Public Parsing Functions ---

/// Number of bytes to read for a response of `words` data words.
#[inline]
pub const fn response_len(words: usize) -> usize {
    words * WORD_WITH_CRC_LEN
}

/// Splits a raw response into CRC-checked data words.
///
/// `buffer` must hold at least `count` words; the first bad CRC aborts decoding.
pub fn parse_words(buffer: &[u8], count: usize) -> Result<Words, ProtocolError> {
    let expected = response_len(count.min(MAX_RESPONSE_WORDS));
    if buffer.len() < expected {
        return Err(ProtocolError::ShortResponse {
            expected,
            got: buffer.len(),
        });
    }
    buffer[..expected]
        .chunks_exact(WORD_WITH_CRC_LEN)
        .map(verify_word)
        .collect()
}

/// `true` once a new measurement can be read.
pub fn parse_data_ready(buffer: &[u8]) -> Result<bool, ProtocolError> {
    let words = parse_words(buffer, 1)?;
    Ok(words[0] == 1)
}

/// Decodes the temperature offset register.
pub fn parse_temperature_offset(buffer: &[u8]) -> Result<Temperature, ProtocolError> {
    let words = parse_words(buffer, 1)?;
    Ok(Temperature::from_offset_ticks(words[0]))
}

pub fn parse_firmware_version(buffer: &[u8]) -> Result<FirmwareVersion, ProtocolError> {
    let words = parse_words(buffer, 1)?;
    let [major, minor] = words[0].to_be_bytes();
    Ok(FirmwareVersion { major, minor })
}

/// Decodes CO2, temperature and humidity, each a big-endian IEEE754 float
/// spread over two words.
pub fn parse_measurement(buffer: &[u8]) -> Result<Measurement, ProtocolError> {
    let w = parse_words(buffer, MAX_RESPONSE_WORDS)?;
    let co2 = finite(float_from_words(w[0], w[1]), "co2")?;
    let temperature = finite(float_from_words(w[2], w[3]), "temperature")?;
    let humidity = finite(float_from_words(w[4], w[5]), "humidity")?;
    Ok(Measurement {
        co2: Concentration::from_ppm(co2),
        temperature: Temperature::from_degrees_celsius(temperature),
        humidity: RelativeHumidity::from_percent(humidity),
    })
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::crc::encode_word;

    fn frame(words: &[u16]) -> Vec<u8> {
        words.iter().flat_map(|w| encode_word(*w)).collect()
    }

    fn float_words(value: f32) -> [u16; 2] {
        let bits = value.to_bits();
        [(bits >> 16) as u16, bits as u16]
    }

    #[test]
    fn test_data_ready() {
        assert_eq!(parse_data_ready(&frame(&[1])), Ok(true));
        assert_eq!(parse_data_ready(&frame(&[0])), Ok(false));
    }

    #[test]
    fn test_temperature_offset() {
        let offset = parse_temperature_offset(&frame(&[150])).unwrap();
        assert_eq!(offset.to_offset_ticks(), Ok(150));
    }

    #[test]
    fn test_firmware_version() {
        let version = parse_firmware_version(&frame(&[0x0342])).unwrap();
        assert_eq!(version, FirmwareVersion { major: 3, minor: 66 });
        assert_eq!(version.to_string(), "3.66");
    }

    #[test]
    fn test_measurement_datasheet_example() {
        // CO2 ~439 ppm, T ~27.2 °C, RH ~48.8 %
        let buffer = frame(&[0x43DB, 0x8C2E, 0x41D9, 0xE7FF, 0x4243, 0x3A1B]);
        let m = parse_measurement(&buffer).unwrap();
        assert!((m.co2.ppm() - 439.09).abs() < 0.01, "co2 {}", m.co2);
        assert!((m.temperature.degrees_celsius() - 27.24).abs() < 0.01, "t {}", m.temperature);
        assert!((m.humidity.percent() - 48.81).abs() < 0.01, "rh {}", m.humidity);
    }

    #[test]
    fn test_measurement_exact_floats() {
        let mut words = Vec::new();
        for v in [612.5f32, 21.25, 40.0] {
            words.extend_from_slice(&float_words(v));
        }
        let m = parse_measurement(&frame(&words)).unwrap();
        assert_eq!(m.co2.ppm(), 612.5);
        assert_eq!(m.temperature.degrees_celsius(), 21.25);
        assert_eq!(m.humidity.percent(), 40.0);
    }

    #[test]
    fn test_measurement_rejects_nan() {
        let mut words = Vec::new();
        for v in [400.0f32, f32::NAN, 40.0] {
            words.extend_from_slice(&float_words(v));
        }
        assert_eq!(
            parse_measurement(&frame(&words)),
            Err(ProtocolError::InvalidValue { field: "temperature" })
        );
    }

    #[test]
    fn test_short_and_corrupt_responses() {
        let mut buffer = frame(&[1]);
        buffer.pop();
        assert_eq!(
            parse_data_ready(&buffer),
            Err(ProtocolError::ShortResponse { expected: 3, got: 2 })
        );

        let mut buffer = frame(&[0x43DB, 0x8C2E, 0x41D9, 0xE7FF, 0x4243, 0x3A1B]);
        buffer[7] ^= 0x01;
        assert!(matches!(
            parse_measurement(&buffer),
            Err(ProtocolError::CrcMismatch { .. })
        ));
    }
}

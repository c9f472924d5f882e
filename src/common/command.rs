// src/common/command.rs

//! SCD30 command definitions.
//!
//! Every command is a 16-bit big-endian code. Commands that carry an argument
//! append one 16-bit word followed by its CRC-8; the code itself is never
//! CRC-protected.

use core::fmt;

use arrayvec::ArrayVec;

use super::crc::encode_word;

/// Largest frame on the wire: code (2) + argument (2) + CRC (1).
pub const MAX_FRAME_LEN: usize = 5;

/// A fully encoded command ready to be written to the bus.
pub type CommandFrame = ArrayVec<u8, MAX_FRAME_LEN>;

/// Represents an SCD30 command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start continuous measurement (`0x0010`). `ambient_pressure` in mbar,
    /// `0` disables pressure compensation.
    TriggerContinuousMeasurement { ambient_pressure: u16 },

    /// Set the continuous measurement interval (`0x4600`) in seconds.
    SetMeasurementInterval { seconds: u16 },

    /// Query whether a measurement can be read (`0x0202`).
    GetDataReady,

    /// Read CO2, temperature and humidity (`0x0300`).
    ReadMeasurement,

    /// Write the reference CO2 concentration for forced recalibration (`0x5204`).
    SetForcedRecalibration { ppm: u16 },

    /// Read the temperature offset (`0x5403`), in 0.01 °C ticks.
    GetTemperatureOffset,

    /// Write the temperature offset (`0x5403`), in 0.01 °C ticks.
    SetTemperatureOffset { ticks: u16 },

    /// Read the firmware version (`0xD100`).
    ReadFirmwareVersion,
}

impl Command {
    /// The 16-bit command code.
    pub const fn code(&self) -> u16 {
        match self {
            Command::TriggerContinuousMeasurement { .. } => 0x0010,
            Command::SetMeasurementInterval { .. } => 0x4600,
            Command::GetDataReady => 0x0202,
            Command::ReadMeasurement => 0x0300,
            Command::SetForcedRecalibration { .. } => 0x5204,
            Command::GetTemperatureOffset | Command::SetTemperatureOffset { .. } => 0x5403,
            Command::ReadFirmwareVersion => 0xD100,
        }
    }

    /// The argument word, if the command carries one.
    pub const fn argument(&self) -> Option<u16> {
        match self {
            Command::TriggerContinuousMeasurement { ambient_pressure } => Some(*ambient_pressure),
            Command::SetMeasurementInterval { seconds } => Some(*seconds),
            Command::SetForcedRecalibration { ppm } => Some(*ppm),
            Command::SetTemperatureOffset { ticks } => Some(*ticks),
            Command::GetDataReady
            | Command::ReadMeasurement
            | Command::GetTemperatureOffset
            | Command::ReadFirmwareVersion => None,
        }
    }

    /// Number of data words (each followed by a CRC) the device sends back.
    /// Zero for write-only commands.
    pub const fn response_words(&self) -> usize {
        match self {
            Command::GetDataReady => 1,
            Command::ReadMeasurement => 6,
            Command::GetTemperatureOffset => 1,
            Command::ReadFirmwareVersion => 1,
            Command::TriggerContinuousMeasurement { .. }
            | Command::SetMeasurementInterval { .. }
            | Command::SetForcedRecalibration { .. }
            | Command::SetTemperatureOffset { .. } => 0,
        }
    }

    /// Encodes the command into its wire frame.
    pub fn encode(&self) -> CommandFrame {
        let mut frame = CommandFrame::new();
        // Capacity is MAX_FRAME_LEN, which fits the longest command exactly.
        frame.extend(self.code().to_be_bytes());
        if let Some(arg) = self.argument() {
            frame.extend(encode_word(arg));
        }
        frame
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::TriggerContinuousMeasurement { ambient_pressure } => {
                write!(f, "trigger continuous measurement (pressure {} mbar)", ambient_pressure)
            }
            Command::SetMeasurementInterval { seconds } => {
                write!(f, "set measurement interval ({} s)", seconds)
            }
            Command::GetDataReady => f.write_str("get data ready"),
            Command::ReadMeasurement => f.write_str("read measurement"),
            Command::SetForcedRecalibration { ppm } => {
                write!(f, "set forced recalibration ({} ppm)", ppm)
            }
            Command::GetTemperatureOffset => f.write_str("get temperature offset"),
            Command::SetTemperatureOffset { ticks } => {
                write!(f, "set temperature offset ({} x 0.01 °C)", ticks)
            }
            Command::ReadFirmwareVersion => f.write_str("read firmware version"),
        }
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_commands_encode_code_only() {
        assert_eq!(Command::GetDataReady.encode().as_slice(), &[0x02, 0x02]);
        assert_eq!(Command::ReadMeasurement.encode().as_slice(), &[0x03, 0x00]);
        assert_eq!(Command::GetTemperatureOffset.encode().as_slice(), &[0x54, 0x03]);
        assert_eq!(Command::ReadFirmwareVersion.encode().as_slice(), &[0xD1, 0x00]);
    }

    #[test]
    fn test_argument_commands_append_crc() {
        // Interface description example: continuous measurement without pressure compensation
        assert_eq!(
            Command::TriggerContinuousMeasurement { ambient_pressure: 0 }.encode().as_slice(),
            &[0x00, 0x10, 0x00, 0x00, 0x81]
        );
        // Interval of 2 s
        assert_eq!(
            Command::SetMeasurementInterval { seconds: 2 }.encode().as_slice(),
            &[0x46, 0x00, 0x00, 0x02, 0xE3]
        );
    }

    #[test]
    fn test_shared_code_for_offset() {
        let get = Command::GetTemperatureOffset;
        let set = Command::SetTemperatureOffset { ticks: 150 };
        assert_eq!(get.code(), set.code());
        assert_eq!(get.argument(), None);
        assert_eq!(set.argument(), Some(150));
        assert_eq!(get.response_words(), 1);
        assert_eq!(set.response_words(), 0);
        assert_eq!(set.encode().len(), MAX_FRAME_LEN);
    }

    #[test]
    fn test_forced_recalibration_frame() {
        let frame = Command::SetForcedRecalibration { ppm: 450 }.encode();
        assert_eq!(&frame[..4], &[0x52, 0x04, 0x01, 0xC2]);
        assert_eq!(frame[4], crate::common::crc::calculate_crc8([0x01, 0xC2]));
    }

    #[test]
    fn test_display() {
        assert_eq!(Command::ReadMeasurement.to_string(), "read measurement");
        assert_eq!(
            Command::SetForcedRecalibration { ppm: 400 }.to_string(),
            "set forced recalibration (400 ppm)"
        );
    }
}

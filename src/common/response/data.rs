// src/common/response/data.rs

use core::fmt;

use crate::common::units::{Concentration, Gas, GasConcentration, RelativeHumidity, Temperature};

/// One decoded sample from the read measurement command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub co2: Concentration,
    pub temperature: Temperature,
    pub humidity: RelativeHumidity,
}

impl Measurement {
    /// The CO2 reading tagged with its gas identity.
    pub fn gas_concentration(&self) -> GasConcentration {
        GasConcentration::new(Gas::CarbonDioxide, self.co2)
    }
}

/// Firmware version as reported by the device (major in the high byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

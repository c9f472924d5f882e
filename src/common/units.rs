// src/common/units.rs

//! Physical quantities measured or configured on the sensor.
//!
//! Values are built from a number and a unit multiplier, e.g.
//! `22.5 * DEGREE_CELSIUS` or `450.0 * PART_PER_MILLION`.

use core::fmt;
use core::ops::Mul;

use super::error::ArgumentError;

// --- Temperature ---

/// A temperature, stored in degrees Celsius.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Default)]
pub struct Temperature(f64);

/// One degree Celsius.
pub const DEGREE_CELSIUS: Temperature = Temperature(1.0);

/// The device's temperature offset register counts hundredths of a degree.
const OFFSET_TICKS_PER_DEGREE: f64 = 100.0;

impl Temperature {
    pub const fn from_degrees_celsius(value: f64) -> Self {
        Self(value)
    }

    pub const fn degrees_celsius(&self) -> f64 {
        self.0
    }

    /// Largest offset the device can hold: `u16::MAX` ticks of 0.01 °C.
    pub const MAX_OFFSET: Temperature = Temperature(655.35);

    /// Converts an offset into the unsigned 0.01 °C ticks written to the device.
    ///
    /// Rounds to the nearest tick. Negative, non-finite or too large offsets
    /// are rejected.
    pub fn to_offset_ticks(&self) -> Result<u16, ArgumentError> {
        let ticks = (self.0 * OFFSET_TICKS_PER_DEGREE).round();
        if !ticks.is_finite() || ticks < 0.0 || ticks > f64::from(u16::MAX) {
            return Err(ArgumentError::OutOfRange {
                name: "temperature offset",
                value: self.0,
                min: 0.0,
                max: Self::MAX_OFFSET.0,
            });
        }
        Ok(ticks as u16)
    }

    /// Yields the closest `f64` to the decimal offset, so `0.35 * DEGREE_CELSIUS`
    /// written as 35 ticks reads back equal.
    pub fn from_offset_ticks(ticks: u16) -> Self {
        Self(f64::from(ticks) / OFFSET_TICKS_PER_DEGREE)
    }
}

impl Mul<Temperature> for f64 {
    type Output = Temperature;

    fn mul(self, unit: Temperature) -> Temperature {
        Temperature(self * unit.0)
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}°C", self.0)
    }
}

// --- Concentration ---

/// A gas concentration, stored in parts per million.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Default)]
pub struct Concentration(f64);

pub const PART_PER_MILLION: Concentration = Concentration(1.0);
pub const PART_PER_BILLION: Concentration = Concentration(0.001);

impl Concentration {
    /// Lowest reference value accepted for forced recalibration.
    pub const FORCED_RECALIBRATION_MIN: Concentration = Concentration(400.0);
    /// Highest reference value accepted for forced recalibration.
    pub const FORCED_RECALIBRATION_MAX: Concentration = Concentration(2000.0);

    pub const fn from_ppm(value: f64) -> Self {
        Self(value)
    }

    pub const fn ppm(&self) -> f64 {
        self.0
    }

    /// Converts a reference concentration into the whole-ppm word written
    /// for forced recalibration.
    pub fn to_forced_recalibration_ppm(&self) -> Result<u16, ArgumentError> {
        let ppm = self.0.round();
        if !ppm.is_finite()
            || ppm < Self::FORCED_RECALIBRATION_MIN.0
            || ppm > Self::FORCED_RECALIBRATION_MAX.0
        {
            return Err(ArgumentError::OutOfRange {
                name: "forced recalibration target (ppm)",
                value: self.0,
                min: Self::FORCED_RECALIBRATION_MIN.0,
                max: Self::FORCED_RECALIBRATION_MAX.0,
            });
        }
        Ok(ppm as u16)
    }
}

impl Mul<Concentration> for f64 {
    type Output = Concentration;

    fn mul(self, unit: Concentration) -> Concentration {
        Concentration(self * unit.0)
    }
}

impl fmt::Display for Concentration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}ppm", self.0)
    }
}

// --- Relative Humidity ---

/// Relative humidity, stored in percent.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Default)]
pub struct RelativeHumidity(f64);

pub const PERCENT: RelativeHumidity = RelativeHumidity(1.0);

impl RelativeHumidity {
    pub const fn from_percent(value: f64) -> Self {
        Self(value)
    }

    pub const fn percent(&self) -> f64 {
        self.0
    }
}

impl Mul<RelativeHumidity> for f64 {
    type Output = RelativeHumidity;

    fn mul(self, unit: RelativeHumidity) -> RelativeHumidity {
        RelativeHumidity(self * unit.0)
    }
}

impl fmt::Display for RelativeHumidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.0)
    }
}

// --- Gas ---

/// Gases a sensor can report a concentration for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Gas {
    CarbonDioxide,
}

impl fmt::Display for Gas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gas::CarbonDioxide => f.write_str("CO2"),
        }
    }
}

/// A concentration tagged with the gas it was measured for.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GasConcentration {
    pub gas: Gas,
    pub amount: Concentration,
}

impl GasConcentration {
    pub const fn new(gas: Gas, amount: Concentration) -> Self {
        Self { gas, amount }
    }
}

impl fmt::Display for GasConcentration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.gas, self.amount)
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplier_construction() {
        assert_eq!((22.5 * DEGREE_CELSIUS).degrees_celsius(), 22.5);
        assert_eq!((450.0 * PART_PER_MILLION).ppm(), 450.0);
        assert_eq!((1500.0 * PART_PER_BILLION).ppm(), 1.5);
        assert_eq!((45.2 * PERCENT).percent(), 45.2);
    }

    #[test]
    fn test_display() {
        assert_eq!((22.5 * DEGREE_CELSIUS).to_string(), "22.50°C");
        assert_eq!((450.0 * PART_PER_MILLION).to_string(), "450.00ppm");
        assert_eq!((45.2 * PERCENT).to_string(), "45.20%");
        assert_eq!(
            GasConcentration::new(Gas::CarbonDioxide, 612.25 * PART_PER_MILLION).to_string(),
            "CO2 612.25ppm"
        );
    }

    #[test]
    fn test_offset_ticks() {
        assert_eq!((1.5 * DEGREE_CELSIUS).to_offset_ticks(), Ok(150));
        assert_eq!((0.0 * DEGREE_CELSIUS).to_offset_ticks(), Ok(0));
        assert_eq!(Temperature::MAX_OFFSET.to_offset_ticks(), Ok(u16::MAX));
        // Rounds to the nearest tick
        assert_eq!((2.004 * DEGREE_CELSIUS).to_offset_ticks(), Ok(200));
        assert_eq!((2.006 * DEGREE_CELSIUS).to_offset_ticks(), Ok(201));
        assert_eq!(Temperature::from_offset_ticks(150).degrees_celsius(), 1.5);
    }

    #[test]
    fn test_offset_ticks_out_of_range() {
        assert!(matches!(
            (-0.5 * DEGREE_CELSIUS).to_offset_ticks(),
            Err(ArgumentError::OutOfRange { name: "temperature offset", .. })
        ));
        assert!((655.36 * DEGREE_CELSIUS).to_offset_ticks().is_err());
        assert!((f64::NAN * DEGREE_CELSIUS).to_offset_ticks().is_err());
        assert!((f64::INFINITY * DEGREE_CELSIUS).to_offset_ticks().is_err());
    }

    #[test]
    fn test_offset_ticks_read_back_as_typed() {
        for typed in [0.35, 0.07, 1.15, 2.01, 655.35] {
            let offset = typed * DEGREE_CELSIUS;
            let ticks = offset.to_offset_ticks().unwrap();
            assert_eq!(Temperature::from_offset_ticks(ticks), offset, "{} °C", typed);
        }
    }

    #[test]
    fn test_forced_recalibration_range() {
        assert_eq!((400.0 * PART_PER_MILLION).to_forced_recalibration_ppm(), Ok(400));
        assert_eq!((2000.0 * PART_PER_MILLION).to_forced_recalibration_ppm(), Ok(2000));
        assert_eq!((450.4 * PART_PER_MILLION).to_forced_recalibration_ppm(), Ok(450));
        assert!((399.0 * PART_PER_MILLION).to_forced_recalibration_ppm().is_err());
        assert!((2001.0 * PART_PER_MILLION).to_forced_recalibration_ppm().is_err());
        assert!((f64::NAN * PART_PER_MILLION).to_forced_recalibration_ppm().is_err());
    }
}

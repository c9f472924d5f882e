// src/sensor/options.rs

use std::time::Duration;

use crate::common::error::ArgumentError;
use crate::common::timing::{
    is_valid_measurement_interval, MEASUREMENT_INTERVAL_DEFAULT, MEASUREMENT_INTERVAL_MAX,
    MEASUREMENT_INTERVAL_MIN,
};
use crate::common::units::Concentration;

/// Ambient pressure compensation range accepted by the device, in mbar.
pub const AMBIENT_PRESSURE_MIN: u16 = 700;
pub const AMBIENT_PRESSURE_MAX: u16 = 1400;

/// Calibrate against a known CO2 concentration `delay` after the run starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForcedRecalibration {
    pub target: Concentration,
    pub delay: Duration,
}

impl ForcedRecalibration {
    pub fn new(target: Concentration, delay: Duration) -> Self {
        Self { target, delay }
    }
}

/// Construction-time configuration of an [`Scd30`](super::Scd30).
#[derive(Debug, Clone, PartialEq)]
pub struct SensorOptions {
    pub forced_recalibration: Option<ForcedRecalibration>,
    pub measurement_interval: Duration,
    /// `None` leaves pressure compensation off.
    pub ambient_pressure_mbar: Option<u16>,
}

impl Default for SensorOptions {
    fn default() -> Self {
        Self {
            forced_recalibration: None,
            measurement_interval: MEASUREMENT_INTERVAL_DEFAULT,
            ambient_pressure_mbar: None,
        }
    }
}

impl SensorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_forced_recalibration(mut self, target: Concentration, delay: Duration) -> Self {
        self.forced_recalibration = Some(ForcedRecalibration::new(target, delay));
        self
    }

    pub fn with_measurement_interval(mut self, interval: Duration) -> Self {
        self.measurement_interval = interval;
        self
    }

    pub fn with_ambient_pressure(mut self, mbar: u16) -> Self {
        self.ambient_pressure_mbar = Some(mbar);
        self
    }

    /// Checks every value against the device limits and converts them to
    /// the words written on the wire.
    pub(crate) fn validate(&self) -> Result<DeviceSettings, ArgumentError> {
        let forced_recalibration = match self.forced_recalibration {
            Some(frc) => Some(ScheduledRecalibration {
                ppm: frc.target.to_forced_recalibration_ppm()?,
                delay: frc.delay,
            }),
            None => None,
        };

        if !is_valid_measurement_interval(self.measurement_interval) {
            return Err(ArgumentError::OutOfRange {
                name: "measurement interval (s)",
                value: self.measurement_interval.as_secs_f64(),
                min: MEASUREMENT_INTERVAL_MIN.as_secs_f64(),
                max: MEASUREMENT_INTERVAL_MAX.as_secs_f64(),
            });
        }

        let ambient_pressure = match self.ambient_pressure_mbar {
            Some(mbar) if !(AMBIENT_PRESSURE_MIN..=AMBIENT_PRESSURE_MAX).contains(&mbar) => {
                return Err(ArgumentError::OutOfRange {
                    name: "ambient pressure (mbar)",
                    value: f64::from(mbar),
                    min: f64::from(AMBIENT_PRESSURE_MIN),
                    max: f64::from(AMBIENT_PRESSURE_MAX),
                });
            }
            Some(mbar) => mbar,
            None => 0,
        };

        Ok(DeviceSettings {
            forced_recalibration,
            // Range checked above, always fits.
            interval_seconds: self.measurement_interval.as_secs() as u16,
            ambient_pressure,
        })
    }
}

/// Validated options in device units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DeviceSettings {
    pub forced_recalibration: Option<ScheduledRecalibration>,
    pub interval_seconds: u16,
    /// `0` disables compensation.
    pub ambient_pressure: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScheduledRecalibration {
    pub ppm: u16,
    pub delay: Duration,
}

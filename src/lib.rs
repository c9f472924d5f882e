// src/lib.rs

//! Configuration and forced recalibration for the Sensirion SCD30 CO2 sensor.
//!
//! The crate is split the same way the device is used:
//!
//! - [`common`] holds the wire-level pieces (commands, CRC, response decoding),
//!   the port traits and the unit types.
//! - [`sensor`] owns the port and runs the sampling loop, including the timed
//!   forced recalibration.
//! - [`consumer`] fans the measurement streams out to user handlers.
//! - [`process`] supervises concurrent runs under one cancellable lifetime.
//! - [`workflow`] wires the above into the two commands the binary exposes.

pub mod common;
pub mod consumer;
pub mod process;
pub mod sensor;
pub mod workflow;

// Re-export key types for convenience
pub use common::{BusConfig, Error, I2cAddr};
pub use process::{Context, ProcessGroup};
pub use sensor::{ForcedRecalibration, Scd30, Sensor, SensorOptions};

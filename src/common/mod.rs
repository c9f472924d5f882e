// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod address;
pub mod command;
pub mod crc;
pub mod error;
pub mod hal_traits;
pub mod response;
pub mod timing;
pub mod units;

// --- Re-export key types/traits/functions for easier access ---

// From address.rs
pub use address::{BusConfig, I2cAddr};

// From command.rs
pub use command::{Command, CommandFrame};

// From crc.rs
pub use crc::{calculate_crc8, encode_word, verify_word};

// From error.rs
pub use error::{ArgumentError, Error, HandlerError, PortError, ProtocolError};

// From hal_traits.rs
pub use hal_traits::{I2cPort, Port, PortFactory};

// From response/mod.rs
pub use response::{FirmwareVersion, Measurement};

// From units.rs
pub use units::{
    Concentration, Gas, GasConcentration, RelativeHumidity, Temperature, DEGREE_CELSIUS,
    PART_PER_BILLION, PART_PER_MILLION, PERCENT,
};

// --- Feature-gated re-exports ---

#[cfg(feature = "linux")]
pub use hal_traits::LinuxI2cPortFactory;

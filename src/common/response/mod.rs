// src/common/response/mod.rs

mod data;
pub mod parse;

pub use data::{FirmwareVersion, Measurement};
pub use parse::{
    parse_data_ready, parse_firmware_version, parse_measurement, parse_temperature_offset,
    parse_words, response_len,
};

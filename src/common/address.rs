// src/common/address.rs

use super::error::ArgumentError;
use core::convert::TryFrom;
use core::fmt;

/// A validated 7-bit I2C device address.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct I2cAddr(u8);

impl I2cAddr {
    /// Fixed address of the SCD30.
    pub const SCD30: I2cAddr = I2cAddr(0x61);

    /// Creates a new `I2cAddr` if the value fits in seven bits and is not reserved.
    pub fn new(address: u16) -> Result<Self, ArgumentError> {
        if Self::is_valid(address) {
            Ok(I2cAddr(address as u8))
        } else {
            Err(ArgumentError::InvalidAddress(address))
        }
    }

    /// Parses a decimal or `0x`-prefixed hexadecimal address.
    pub fn parse(text: &str) -> Result<Self, ArgumentError> {
        let trimmed = text.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => u16::from_str_radix(hex, 16),
            None => trimmed.parse::<u16>(),
        };
        let value = parsed.map_err(|_| ArgumentError::InvalidNumber {
            name: "I2C address",
            value: text.to_string(),
        })?;
        Self::new(value)
    }

    #[inline]
    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    /// Reserved addresses (0x00..=0x07 and 0x78..=0x7F) are rejected.
    #[inline]
    pub const fn is_valid(address: u16) -> bool {
        matches!(address, 0x08..=0x77)
    }
}

impl Default for I2cAddr {
    fn default() -> Self {
        Self::SCD30
    }
}

impl TryFrom<u16> for I2cAddr {
    type Error = ArgumentError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<I2cAddr> for u8 {
    fn from(value: I2cAddr) -> Self {
        value.0
    }
}

impl fmt::Display for I2cAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Where the sensor lives: Linux bus number plus device address.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct BusConfig {
    pub bus: u8,
    pub address: I2cAddr,
}

impl BusConfig {
    pub const DEFAULT_BUS: u8 = 1;

    pub fn new(bus: u8, address: I2cAddr) -> Self {
        Self { bus, address }
    }

    /// Path of the character device for this bus, e.g. `/dev/i2c-1`.
    pub fn device_path(&self) -> String {
        format!("/dev/i2c-{}", self.bus)
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            bus: Self::DEFAULT_BUS,
            address: I2cAddr::default(),
        }
    }
}

impl fmt::Display for BusConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.device_path(), self.address)
    }
}

// src/common/hal_traits.rs

use embedded_hal::i2c::{Error as _, I2c};

use super::address::I2cAddr;
#[cfg(feature = "linux")]
use super::address::BusConfig;
use super::error::PortError;

/// An open, exclusively owned channel to one device.
///
/// Transfers are blocking and are called directly from async tasks. Each
/// one moves at most 18 bytes over I2C.
///
/// Dropping the port releases the underlying bus handle.
pub trait Port: Send {
    /// Writes one complete frame in a single bus transaction.
    fn write(&mut self, bytes: &[u8]) -> Result<(), PortError>;

    /// Fills `buffer` from the device in a single bus transaction.
    fn read(&mut self, buffer: &mut [u8]) -> Result<(), PortError>;
}

/// Produces ports for a fixed bus configuration.
///
/// Each call to `open` yields an independent handle; callers hold it only for
/// the duration of one operation or one run.
pub trait PortFactory: Send + Sync {
    type Port: Port;

    fn open(&self) -> Result<Self::Port, PortError>;
}

/// Adapts any `embedded-hal` I2C bus to a [`Port`] for one address.
pub struct I2cPort<I> {
    i2c: I,
    address: I2cAddr,
}

impl<I: I2c> I2cPort<I> {
    pub fn new(i2c: I, address: I2cAddr) -> Self {
        Self { i2c, address }
    }

    pub fn address(&self) -> I2cAddr {
        self.address
    }

    /// Gives the bus back, e.g. to share it with another driver.
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I> Port for I2cPort<I>
where
    I: I2c + Send,
{
    fn write(&mut self, bytes: &[u8]) -> Result<(), PortError> {
        self.i2c
            .write(self.address.as_u8(), bytes)
            .map_err(|e| PortError::Bus {
                operation: "write",
                kind: e.kind(),
            })
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<(), PortError> {
        self.i2c
            .read(self.address.as_u8(), buffer)
            .map_err(|e| PortError::Bus {
                operation: "read",
                kind: e.kind(),
            })
    }
}

/// Opens `/dev/i2c-N` through `linux-embedded-hal`.
#[cfg(feature = "linux")]
#[derive(Debug, Clone, Copy)]
pub struct LinuxI2cPortFactory {
    config: BusConfig,
}

#[cfg(feature = "linux")]
impl LinuxI2cPortFactory {
    pub fn new(config: BusConfig) -> Self {
        Self { config }
    }
}

#[cfg(feature = "linux")]
impl PortFactory for LinuxI2cPortFactory {
    type Port = I2cPort<linux_embedded_hal::I2cdev>;

    fn open(&self) -> Result<Self::Port, PortError> {
        let device = self.config.device_path();
        let i2c = linux_embedded_hal::I2cdev::new(&device).map_err(|e| PortError::Unreachable {
            device: device.clone(),
            reason: e.to_string(),
        })?;
        log::debug!("opened {} for address {}", device, self.config.address);
        Ok(I2cPort::new(i2c, self.config.address))
    }
}

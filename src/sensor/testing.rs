// src/sensor/testing.rs

//! A simulated SCD30 behind the [`Port`] seam, shared by the crate's tests.

use std::sync::{Arc, Mutex, MutexGuard};

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
use tokio::time::Instant;

use crate::common::crc::{encode_word, verify_word};
use crate::common::error::PortError;
use crate::common::hal_traits::{Port, PortFactory};

/// Observable register and bus state of the simulated device.
#[derive(Debug)]
pub(crate) struct SimState {
    pub offset_ticks: u16,
    pub interval_seconds: u16,
    pub ambient_pressure: Option<u16>,
    pub firmware: u16,
    pub measuring: bool,
    pub data_ready: bool,
    /// Number of samples read so far; sample `n` reports CO2 `400 + n` ppm,
    /// temperature `20 + n / 10` °C and humidity `40 + n` %.
    pub samples: u32,
    /// Every command code written, in order.
    pub commands: Vec<u16>,
    /// Forced recalibration writes with the (virtual) time they arrived.
    pub frc_writes: Vec<(Instant, u16)>,
    pub opens: usize,
    pub releases: usize,
    // --- Failure injection ---
    pub fail_open: bool,
    /// Reads of the measurement register fail once this many samples were read.
    pub fail_after_samples: Option<u32>,
    pub corrupt_reads: bool,
    pending: Option<Vec<u8>>,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            offset_ticks: 0,
            interval_seconds: 2,
            ambient_pressure: None,
            firmware: 0x0342,
            measuring: false,
            data_ready: true,
            samples: 0,
            commands: Vec::new(),
            frc_writes: Vec::new(),
            opens: 0,
            releases: 0,
            fail_open: false,
            fail_after_samples: None,
            corrupt_reads: false,
            pending: None,
        }
    }
}

fn float_words(value: f32) -> [u16; 2] {
    let bits = value.to_bits();
    [(bits >> 16) as u16, bits as u16]
}

fn nack() -> PortError {
    PortError::Bus {
        operation: "read",
        kind: ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
    }
}

impl SimState {
    fn respond(&mut self, words: &[u16]) {
        let mut bytes: Vec<u8> = words.iter().flat_map(|w| encode_word(*w)).collect();
        if self.corrupt_reads {
            if let Some(last) = bytes.last_mut() {
                *last ^= 0xFF;
            }
        }
        self.pending = Some(bytes);
    }

    fn handle_write(&mut self, bytes: &[u8]) -> Result<(), PortError> {
        if bytes.len() != 2 && bytes.len() != 5 {
            return Err(PortError::Bus {
                operation: "write",
                kind: ErrorKind::Other,
            });
        }
        let code = u16::from_be_bytes([bytes[0], bytes[1]]);
        let argument = if bytes.len() == 5 {
            // The real device NACKs a bad argument CRC.
            Some(verify_word(&bytes[2..]).map_err(|_| PortError::Bus {
                operation: "write",
                kind: ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
            })?)
        } else {
            None
        };
        self.commands.push(code);
        self.pending = None;

        match (code, argument) {
            (0x0010, Some(pressure)) => {
                self.measuring = true;
                self.ambient_pressure = (pressure != 0).then_some(pressure);
            }
            (0x4600, Some(seconds)) => self.interval_seconds = seconds,
            (0x5204, Some(ppm)) => self.frc_writes.push((Instant::now(), ppm)),
            (0x5403, Some(ticks)) => self.offset_ticks = ticks,
            (0x5403, None) => self.respond(&[self.offset_ticks]),
            (0xD100, None) => self.respond(&[self.firmware]),
            (0x0202, None) => {
                let ready = self.measuring && self.data_ready;
                self.respond(&[u16::from(ready)]);
            }
            (0x0300, None) => {
                if self.fail_after_samples.is_some_and(|limit| self.samples >= limit) {
                    return Ok(());
                }
                let n = self.samples as f32;
                self.samples += 1;
                let mut words = Vec::with_capacity(6);
                for value in [400.0 + n, 20.0 + n / 10.0, 40.0 + n] {
                    words.extend_from_slice(&float_words(value));
                }
                self.respond(&words);
            }
            _ => {
                return Err(PortError::Bus {
                    operation: "write",
                    kind: ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
                })
            }
        }
        Ok(())
    }

    fn handle_read(&mut self, buffer: &mut [u8]) -> Result<(), PortError> {
        let pending = self.pending.take().ok_or_else(nack)?;
        if pending.len() < buffer.len() {
            return Err(nack());
        }
        buffer.copy_from_slice(&pending[..buffer.len()]);
        Ok(())
    }
}

/// Handle to a simulated device. Clones share the same device.
#[derive(Clone, Default)]
pub(crate) struct SimulatedScd30 {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedScd30 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap()
    }

    pub fn factory(&self) -> SimulatedFactory {
        SimulatedFactory { device: self.clone() }
    }
}

pub(crate) struct SimulatedFactory {
    device: SimulatedScd30,
}

impl PortFactory for SimulatedFactory {
    type Port = SimulatedPort;

    fn open(&self) -> Result<Self::Port, PortError> {
        let mut state = self.device.state();
        if state.fail_open {
            return Err(PortError::Unreachable {
                device: "/dev/i2c-sim".to_string(),
                reason: "no such device".to_string(),
            });
        }
        state.opens += 1;
        Ok(SimulatedPort {
            device: self.device.clone(),
        })
    }
}

pub(crate) struct SimulatedPort {
    device: SimulatedScd30,
}

impl Port for SimulatedPort {
    fn write(&mut self, bytes: &[u8]) -> Result<(), PortError> {
        self.device.state().handle_write(bytes)
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<(), PortError> {
        self.device.state().handle_read(buffer)
    }
}

impl Drop for SimulatedPort {
    fn drop(&mut self) {
        if let Ok(mut state) = self.device.state.lock() {
            state.releases += 1;
        }
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::command::Command;
    use crate::sensor::connection::Connection;

    #[tokio::test(start_paused = true)]
    async fn test_connection_round_trips_offset() {
        let device = SimulatedScd30::new();
        let mut conn = Connection::new(device.factory().open().unwrap());
        conn.set_temperature_offset(150).unwrap();
        let offset = conn.temperature_offset().await.unwrap();
        assert_eq!(offset.to_offset_ticks(), Ok(150));
        assert_eq!(device.state().commands, vec![0x5403, 0x5403]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_reads_measurements_in_sequence() {
        let device = SimulatedScd30::new();
        let mut conn = Connection::new(device.factory().open().unwrap());
        conn.start_continuous_measurement(0).unwrap();
        assert!(conn.data_ready().await.unwrap());
        let first = conn.read_measurement().await.unwrap();
        let second = conn.read_measurement().await.unwrap();
        assert_eq!(first.co2.ppm(), 400.0);
        assert_eq!(second.co2.ppm(), 401.0);
        assert_eq!(second.humidity.percent(), 41.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_waits_execution_time() {
        let device = SimulatedScd30::new();
        let mut conn = Connection::new(device.factory().open().unwrap());
        let start = Instant::now();
        let version = conn.firmware_version().await.unwrap();
        assert_eq!(version.to_string(), "3.66");
        assert!(start.elapsed() >= crate::common::timing::COMMAND_EXECUTION_TIME);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_surfaces_protocol_and_port_errors() {
        let device = SimulatedScd30::new();
        let mut conn = Connection::new(device.factory().open().unwrap());

        device.state().corrupt_reads = true;
        assert!(matches!(
            conn.temperature_offset().await,
            Err(crate::common::Error::Protocol(_))
        ));

        device.state().corrupt_reads = false;
        device.state().fail_after_samples = Some(0);
        assert!(matches!(
            conn.read_measurement().await,
            Err(crate::common::Error::Port(PortError::Bus { operation: "read", .. }))
        ));
    }

    #[test]
    fn test_simulator_rejects_bad_argument_crc() {
        let device = SimulatedScd30::new();
        let mut port = device.factory().open().unwrap();
        let mut frame = Command::SetMeasurementInterval { seconds: 5 }.encode();
        frame[4] ^= 0x01;
        assert!(port.write(&frame).is_err());
        assert_eq!(device.state().interval_seconds, 2);
    }

    #[test]
    fn test_ports_are_counted() {
        let device = SimulatedScd30::new();
        let factory = device.factory();
        drop(factory.open().unwrap());
        let _held = factory.open().unwrap();
        assert_eq!(device.state().opens, 2);
        assert_eq!(device.state().releases, 1);
    }
}

// src/sensor/connection.rs

use log::trace;
use tokio::time::sleep;

use crate::common::command::Command;
use crate::common::error::Error;
use crate::common::hal_traits::Port;
use crate::common::response::{self, FirmwareVersion, Measurement};
use crate::common::timing;
use crate::common::units::Temperature;

const RESPONSE_BUF_SIZE: usize = response::response_len(response::parse::MAX_RESPONSE_WORDS);

/// Command/response transactions over one owned port.
///
/// The port is released when the connection is dropped.
pub(crate) struct Connection<P> {
    port: P,
}

impl<P: Port> Connection<P> {
    pub fn new(port: P) -> Self {
        Self { port }
    }

    // --- Core Transaction Logic ---

    /// Writes a command that has no response.
    fn send(&mut self, command: Command) -> Result<(), Error> {
        trace!("SCD30: -> {}", command);
        self.port.write(&command.encode())?;
        Ok(())
    }

    /// Writes a read command, waits the execution time and reads its words.
    async fn query<'buf>(
        &mut self,
        command: Command,
        buffer: &'buf mut [u8; RESPONSE_BUF_SIZE],
    ) -> Result<&'buf [u8], Error> {
        self.send(command)?;
        sleep(timing::COMMAND_EXECUTION_TIME).await;
        let len = response::response_len(command.response_words());
        let response = &mut buffer[..len];
        self.port.read(response)?;
        trace!("SCD30: <- {:02x?}", response);
        Ok(response)
    }

    // --- Public Operations ---

    pub async fn firmware_version(&mut self) -> Result<FirmwareVersion, Error> {
        let mut buffer = [0u8; RESPONSE_BUF_SIZE];
        let raw = self.query(Command::ReadFirmwareVersion, &mut buffer).await?;
        Ok(response::parse_firmware_version(raw)?)
    }

    pub async fn temperature_offset(&mut self) -> Result<Temperature, Error> {
        let mut buffer = [0u8; RESPONSE_BUF_SIZE];
        let raw = self.query(Command::GetTemperatureOffset, &mut buffer).await?;
        Ok(response::parse_temperature_offset(raw)?)
    }

    pub fn set_temperature_offset(&mut self, ticks: u16) -> Result<(), Error> {
        self.send(Command::SetTemperatureOffset { ticks })
    }

    pub fn start_continuous_measurement(&mut self, ambient_pressure: u16) -> Result<(), Error> {
        self.send(Command::TriggerContinuousMeasurement { ambient_pressure })
    }

    pub fn set_measurement_interval(&mut self, seconds: u16) -> Result<(), Error> {
        self.send(Command::SetMeasurementInterval { seconds })
    }

    pub fn force_recalibration(&mut self, ppm: u16) -> Result<(), Error> {
        self.send(Command::SetForcedRecalibration { ppm })
    }

    pub async fn data_ready(&mut self) -> Result<bool, Error> {
        let mut buffer = [0u8; RESPONSE_BUF_SIZE];
        let raw = self.query(Command::GetDataReady, &mut buffer).await?;
        Ok(response::parse_data_ready(raw)?)
    }

    pub async fn read_measurement(&mut self) -> Result<Measurement, Error> {
        let mut buffer = [0u8; RESPONSE_BUF_SIZE];
        let raw = self.query(Command::ReadMeasurement, &mut buffer).await?;
        Ok(response::parse_measurement(raw)?)
    }
}

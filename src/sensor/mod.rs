// src/sensor/mod.rs

// The sensor owns the port and produces the measurement streams.

mod connection;
mod options;
pub mod publisher;
mod run;

#[cfg(test)]
pub(crate) mod testing;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use log::{debug, info};

use crate::common::error::{ArgumentError, Error};
use crate::common::hal_traits::PortFactory;
use crate::common::units::{GasConcentration, RelativeHumidity, Temperature};
use crate::process::Context;

use connection::Connection;
use options::DeviceSettings;

pub use options::{ForcedRecalibration, SensorOptions, AMBIENT_PRESSURE_MAX, AMBIENT_PRESSURE_MIN};
pub use publisher::{Publisher, Subscription};

// --- Traits ---

/// A configurable environmental sensor with a long-running measurement loop.
#[async_trait]
pub trait Sensor: Send + Sync {
    /// Reads the temperature offset from the device.
    async fn temperature_offset(&self, ctx: &Context) -> Result<Temperature, Error>;

    /// Writes the temperature offset to the device.
    async fn set_temperature_offset(&self, ctx: &Context, offset: Temperature) -> Result<(), Error>;

    /// Samples until `ctx` is done or the device fails.
    ///
    /// Returns `Ok(())` on cancellation or deadline. Can be called once.
    async fn run(&self, ctx: &Context) -> Result<(), Error>;
}

/// Stream of gas concentrations produced by a running sensor.
pub trait GasConcentrationSource {
    fn gas_concentrations(&self) -> Subscription<GasConcentration>;
}

pub trait TemperatureSource {
    fn temperatures(&self) -> Subscription<Temperature>;
}

pub trait HumiditySource {
    fn relative_humidities(&self) -> Subscription<RelativeHumidity>;
}

/// Lifecycle of a sensor instance. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Stopped,
}

// --- SCD30 ---

/// Sensirion SCD30 CO2, temperature and humidity sensor.
pub struct Scd30<F: PortFactory> {
    factory: F,
    settings: DeviceSettings,
    state: Mutex<RunState>,
    last_offset: Mutex<Option<Temperature>>,
    recalibrated: AtomicBool,
    gas: Publisher<GasConcentration>,
    temperature: Publisher<Temperature>,
    humidity: Publisher<RelativeHumidity>,
}

impl<F: PortFactory> Scd30<F> {
    /// Binds a sensor to `factory`. Options are checked against the device
    /// limits here, before the bus is ever touched.
    pub fn new(factory: F, options: SensorOptions) -> Result<Self, ArgumentError> {
        let settings = options.validate()?;
        Ok(Self {
            factory,
            settings,
            state: Mutex::new(RunState::Idle),
            last_offset: Mutex::new(None),
            recalibrated: AtomicBool::new(false),
            gas: Publisher::new(),
            temperature: Publisher::new(),
            humidity: Publisher::new(),
        })
    }

    pub fn state(&self) -> RunState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The offset most recently read from or written to the device.
    pub fn last_known_temperature_offset(&self) -> Option<Temperature> {
        *self.last_offset.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the forced recalibration write went out during the run.
    pub fn forced_recalibration_issued(&self) -> bool {
        self.recalibrated.load(Ordering::SeqCst)
    }

    fn connect(&self) -> Result<Connection<F::Port>, Error> {
        Ok(Connection::new(self.factory.open()?))
    }

    fn remember_offset(&self, offset: Temperature) {
        *self.last_offset.lock().unwrap_or_else(PoisonError::into_inner) = Some(offset);
    }

    /// Moves Idle -> Running, refusing a second run.
    fn begin_run(&self) -> Result<RunGuard<'_, F>, Error> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != RunState::Idle {
            return Err(Error::AlreadyStarted);
        }
        *state = RunState::Running;
        Ok(RunGuard { sensor: self })
    }
}

/// Marks the sensor stopped and ends the streams on every exit from `run`.
struct RunGuard<'a, F: PortFactory> {
    sensor: &'a Scd30<F>,
}

impl<F: PortFactory> Drop for RunGuard<'_, F> {
    fn drop(&mut self) {
        *self.sensor.state.lock().unwrap_or_else(PoisonError::into_inner) = RunState::Stopped;
        self.sensor.gas.close();
        self.sensor.temperature.close();
        self.sensor.humidity.close();
        debug!("SCD30: streams closed");
    }
}

/// Runs `op` unless `ctx` finishes first.
async fn cancellable<T>(
    ctx: &Context,
    op: impl Future<Output = Result<T, Error>>,
) -> Result<T, Error> {
    if ctx.is_done() {
        return Err(Error::Cancelled);
    }
    tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(Error::Cancelled),
        result = op => result,
    }
}

#[async_trait]
impl<F: PortFactory> Sensor for Scd30<F> {
    async fn temperature_offset(&self, ctx: &Context) -> Result<Temperature, Error> {
        cancellable(ctx, async {
            let mut conn = self.connect()?;
            let offset = conn.temperature_offset().await?;
            self.remember_offset(offset);
            Ok(offset)
        })
        .await
    }

    async fn set_temperature_offset(&self, ctx: &Context, offset: Temperature) -> Result<(), Error> {
        let ticks = offset.to_offset_ticks()?;
        cancellable(ctx, async {
            let mut conn = self.connect()?;
            conn.set_temperature_offset(ticks)?;
            self.remember_offset(Temperature::from_offset_ticks(ticks));
            info!("SCD30: temperature offset set to {}", offset);
            Ok(())
        })
        .await
    }

    async fn run(&self, ctx: &Context) -> Result<(), Error> {
        let _guard = self.begin_run()?;
        if ctx.is_done() {
            debug!("SCD30: run finished before setup ({:?})", ctx.done_reason());
            return Ok(());
        }
        // Dropped before the guard, so the port is released before the
        // streams report their end.
        let mut conn = self.connect()?;
        self.run_loop(ctx, &mut conn).await
    }
}

impl<F: PortFactory> GasConcentrationSource for Scd30<F> {
    fn gas_concentrations(&self) -> Subscription<GasConcentration> {
        self.gas.subscribe()
    }
}

impl<F: PortFactory> TemperatureSource for Scd30<F> {
    fn temperatures(&self) -> Subscription<Temperature> {
        self.temperature.subscribe()
    }
}

impl<F: PortFactory> HumiditySource for Scd30<F> {
    fn relative_humidities(&self) -> Subscription<RelativeHumidity> {
        self.humidity.subscribe()
    }
}

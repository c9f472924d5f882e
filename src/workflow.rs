// src/workflow.rs

//! The two command flows: reading and writing the temperature offset, and a
//! bounded forced recalibration session that streams measurements.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use crate::common::error::Error;
use crate::common::hal_traits::PortFactory;
use crate::common::units::Temperature;
use crate::consumer::{GasConsumer, Handler, HumidityConsumer, TemperatureConsumer};
use crate::process::{Context, ProcessGroup};
use crate::sensor::{Scd30, Sensor};

pub use crate::common::timing::{FORCED_RECALIBRATION_DELAY, FORCED_RECALIBRATION_TOTAL};

/// Progress of the temperature offset flow, reported as it happens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OffsetReport {
    /// The offset read from the device before any change.
    Current(Temperature),
    /// The offset that was written.
    Updated(Temperature),
}

/// Whether a recalibration session actually wrote the reference value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationOutcome {
    Applied,
    /// The session ended before the recalibration delay elapsed.
    Skipped,
}

/// Reads the temperature offset and, if `new_offset` is given, writes it.
///
/// The current value is reported before the new one is validated or
/// written, so it is visible even if that step fails.
pub async fn run_temperature_offset<S, R>(
    parent: &Context,
    sensor: Arc<S>,
    new_offset: Option<Temperature>,
    mut report: R,
) -> Result<(), Error>
where
    S: Sensor + ?Sized + 'static,
    R: FnMut(OffsetReport) + Send + 'static,
{
    let mut group = ProcessGroup::new(parent);
    let ctx = group.context().clone();
    group.go(async move {
        let current = sensor.temperature_offset(&ctx).await?;
        report(OffsetReport::Current(current));

        if let Some(offset) = new_offset {
            sensor.set_temperature_offset(&ctx, offset).await?;
            report(OffsetReport::Updated(offset));
        }
        Ok(())
    });
    group.wait().await
}

/// Runs the sensor and one consumer per quantity for `total`, all feeding
/// `handler`. The sensor's forced recalibration directive decides when the
/// reference value is written.
///
/// The deadline ending the session is not an error. Any device or handler
/// failure ends the whole session and is returned.
pub async fn run_forced_recalibration<F, H>(
    parent: &Context,
    sensor: Arc<Scd30<F>>,
    handler: Arc<H>,
    total: Duration,
) -> Result<CalibrationOutcome, Error>
where
    F: PortFactory + 'static,
    H: Handler + ?Sized + 'static,
{
    let ctx = parent.with_timeout(total);

    // Subscribe before the sensor starts so no sample is missed.
    let gas = GasConsumer::new(sensor.as_ref(), Arc::clone(&handler));
    let temperature = TemperatureConsumer::new(sensor.as_ref(), Arc::clone(&handler));
    let humidity = HumidityConsumer::new(sensor.as_ref(), handler);

    let mut group = ProcessGroup::new(&ctx);
    group.start(|ctx| gas.run(ctx));
    group.start(|ctx| temperature.run(ctx));
    group.start(|ctx| humidity.run(ctx));
    let runner = Arc::clone(&sensor);
    group.start(|ctx| async move { runner.run(&ctx).await });

    group.wait().await?;

    if sensor.forced_recalibration_issued() {
        info!("forced recalibration applied");
        Ok(CalibrationOutcome::Applied)
    } else {
        warn!("session ended before the forced recalibration was due");
        Ok(CalibrationOutcome::Skipped)
    }
}

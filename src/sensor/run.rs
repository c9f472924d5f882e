// src/sensor/run.rs

use std::sync::atomic::Ordering;
use std::time::Duration;

use log::{debug, info};
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};

use super::connection::Connection;
use super::Scd30;
use crate::common::error::Error;
use crate::common::hal_traits::{Port, PortFactory};
use crate::common::response::Measurement;
use crate::process::Context;

impl<F: PortFactory> Scd30<F> {
    /// The sampling loop behind [`Sensor::run`](super::Sensor::run).
    ///
    /// Any device error ends the loop immediately and is returned as is.
    pub(super) async fn run_loop<P: Port>(
        &self,
        ctx: &Context,
        conn: &mut Connection<P>,
    ) -> Result<(), Error> {
        let started = Instant::now();

        // --- Device Setup ---
        let firmware = conn.firmware_version().await?;
        info!("SCD30: firmware version {}", firmware);

        conn.start_continuous_measurement(self.settings.ambient_pressure)?;
        conn.set_measurement_interval(self.settings.interval_seconds)?;
        info!(
            "SCD30: continuous measurement started, interval {} s",
            self.settings.interval_seconds
        );

        // --- Calibration Timer ---
        let mut pending = self.settings.forced_recalibration;
        let calibration_at = started + pending.map_or(Duration::ZERO, |frc| frc.delay);
        let calibration = sleep_until(calibration_at);
        tokio::pin!(calibration);
        if let Some(frc) = pending {
            debug!("SCD30: forced recalibration to {} ppm scheduled in {:?}", frc.ppm, frc.delay);
        }

        let mut ticker = interval(Duration::from_secs(u64::from(self.settings.interval_seconds)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = ctx.cancelled() => {
                    info!("SCD30: run finished ({:?})", ctx.done_reason());
                    if pending.is_some() {
                        debug!("SCD30: run ended before the forced recalibration was due");
                    }
                    return Ok(());
                }

                _ = &mut calibration, if pending.is_some() => {
                    if let Some(frc) = pending.take() {
                        conn.force_recalibration(frc.ppm)?;
                        self.recalibrated.store(true, Ordering::SeqCst);
                        info!("SCD30: forced recalibration issued with reference {} ppm", frc.ppm);
                    }
                }

                _ = ticker.tick() => {
                    if conn.data_ready().await? {
                        let measurement = conn.read_measurement().await?;
                        self.publish(measurement);
                    }
                }
            }
        }
    }

    fn publish(&self, measurement: Measurement) {
        debug!(
            "SCD30: {} {} {}",
            measurement.co2, measurement.temperature, measurement.humidity
        );
        self.gas.publish(measurement.gas_concentration());
        self.temperature.publish(measurement.temperature);
        self.humidity.publish(measurement.humidity);
    }
}

// src/consumer/mod.rs

//! Typed consumers: each one forwards a single quantity from a sensor
//! stream to a user handler, one value at a time, in production order.

mod gas;
mod humidity;
mod temperature;

use std::future::Future;

use async_trait::async_trait;
use log::{debug, warn};

use crate::common::error::{Error, HandlerError};
use crate::common::units::{GasConcentration, RelativeHumidity, Temperature};
use crate::process::Context;
use crate::sensor::Subscription;

pub use gas::GasConsumer;
pub use humidity::HumidityConsumer;
pub use temperature::TemperatureConsumer;

// --- Handler Traits ---

/// Receives every gas concentration a consumer forwards.
#[async_trait]
pub trait GasHandler: Send + Sync {
    async fn handle_gas_concentration(
        &self,
        ctx: &Context,
        value: GasConcentration,
    ) -> Result<(), HandlerError>;
}

#[async_trait]
pub trait TemperatureHandler: Send + Sync {
    async fn handle_temperature(&self, ctx: &Context, value: Temperature) -> Result<(), HandlerError>;
}

#[async_trait]
pub trait HumidityHandler: Send + Sync {
    async fn handle_relative_humidity(
        &self,
        ctx: &Context,
        value: RelativeHumidity,
    ) -> Result<(), HandlerError>;
}

/// A sink for all three quantities.
pub trait Handler: GasHandler + TemperatureHandler + HumidityHandler {}

impl<T: GasHandler + TemperatureHandler + HumidityHandler + ?Sized> Handler for T {}

// --- Shared Loop ---

/// Pulls from `subscription` until the stream ends or `ctx` is done, awaiting
/// `deliver` for each value before taking the next.
///
/// A delivery error ends the loop and is returned; the subscription is
/// dropped with it, so the producer stops sending to this consumer.
async fn forward<T, Fut>(
    ctx: &Context,
    mut subscription: Subscription<T>,
    quantity: &'static str,
    mut deliver: impl FnMut(T) -> Fut,
) -> Result<(), Error>
where
    Fut: Future<Output = Result<(), HandlerError>>,
{
    loop {
        let value = tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                debug!("{} consumer cancelled", quantity);
                return Ok(());
            }
            next = subscription.next() => match next {
                Some(value) => value,
                None => {
                    debug!("{} stream ended", quantity);
                    return Ok(());
                }
            },
        };
        if let Err(e) = deliver(value).await {
            warn!("{} handler failed: {}", quantity, e);
            return Err(e.into());
        }
    }
}

// --- Test Handlers ---
#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Records every value; optionally fails on the n-th value of one quantity (1-based).
    #[derive(Default)]
    pub(crate) struct RecordingHandler {
        pub gas: Mutex<Vec<GasConcentration>>,
        pub temperatures: Mutex<Vec<Temperature>>,
        pub humidities: Mutex<Vec<RelativeHumidity>>,
        pub fail_temperature_at: Option<usize>,
    }

    #[async_trait]
    impl GasHandler for RecordingHandler {
        async fn handle_gas_concentration(
            &self,
            _ctx: &Context,
            value: GasConcentration,
        ) -> Result<(), HandlerError> {
            self.gas.lock().unwrap().push(value);
            Ok(())
        }
    }

    #[async_trait]
    impl TemperatureHandler for RecordingHandler {
        async fn handle_temperature(&self, _ctx: &Context, value: Temperature) -> Result<(), HandlerError> {
            let mut seen = self.temperatures.lock().unwrap();
            seen.push(value);
            if self.fail_temperature_at == Some(seen.len()) {
                return Err(HandlerError::new(format!("rejected temperature {}", value)));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl HumidityHandler for RecordingHandler {
        async fn handle_relative_humidity(
            &self,
            _ctx: &Context,
            value: RelativeHumidity,
        ) -> Result<(), HandlerError> {
            self.humidities.lock().unwrap().push(value);
            Ok(())
        }
    }
}

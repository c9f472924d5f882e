// src/consumer/gas.rs

use std::sync::Arc;

use super::{forward, GasHandler};
use crate::common::error::Error;
use crate::common::units::GasConcentration;
use crate::process::Context;
use crate::sensor::{GasConcentrationSource, Subscription};

/// Forwards gas concentrations to a [`GasHandler`].
pub struct GasConsumer<H: ?Sized> {
    subscription: Subscription<GasConcentration>,
    handler: Arc<H>,
}

impl<H: GasHandler + ?Sized + 'static> GasConsumer<H> {
    /// Subscribes immediately, so nothing produced after this call is missed.
    pub fn new<S: GasConcentrationSource + ?Sized>(source: &S, handler: Arc<H>) -> Self {
        Self {
            subscription: source.gas_concentrations(),
            handler,
        }
    }

    /// Ends with `Ok(())` when `ctx` is done or the sensor stops, and with
    /// the handler's error otherwise.
    pub async fn run(self, ctx: Context) -> Result<(), Error> {
        let handler = self.handler;
        forward(&ctx, self.subscription, "gas concentration", |value| {
            let handler = Arc::clone(&handler);
            let ctx = ctx.clone();
            async move { handler.handle_gas_concentration(&ctx, value).await }
        })
        .await
    }
}

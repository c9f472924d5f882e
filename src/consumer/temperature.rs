// src/consumer/temperature.rs

use std::sync::Arc;

use super::{forward, TemperatureHandler};
use crate::common::error::Error;
use crate::common::units::Temperature;
use crate::process::Context;
use crate::sensor::{Subscription, TemperatureSource};

/// Forwards temperatures to a [`TemperatureHandler`].
pub struct TemperatureConsumer<H: ?Sized> {
    subscription: Subscription<Temperature>,
    handler: Arc<H>,
}

impl<H: TemperatureHandler + ?Sized + 'static> TemperatureConsumer<H> {
    pub fn new<S: TemperatureSource + ?Sized>(source: &S, handler: Arc<H>) -> Self {
        Self {
            subscription: source.temperatures(),
            handler,
        }
    }

    pub async fn run(self, ctx: Context) -> Result<(), Error> {
        let handler = self.handler;
        forward(&ctx, self.subscription, "temperature", |value| {
            let handler = Arc::clone(&handler);
            let ctx = ctx.clone();
            async move { handler.handle_temperature(&ctx, value).await }
        })
        .await
    }
}

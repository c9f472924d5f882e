// src/consumer/humidity.rs

use std::sync::Arc;

use super::{forward, HumidityHandler};
use crate::common::error::Error;
use crate::common::units::RelativeHumidity;
use crate::process::Context;
use crate::sensor::{HumiditySource, Subscription};

/// Forwards relative humidity to a [`HumidityHandler`].
pub struct HumidityConsumer<H: ?Sized> {
    subscription: Subscription<RelativeHumidity>,
    handler: Arc<H>,
}

impl<H: HumidityHandler + ?Sized + 'static> HumidityConsumer<H> {
    pub fn new<S: HumiditySource + ?Sized>(source: &S, handler: Arc<H>) -> Self {
        Self {
            subscription: source.relative_humidities(),
            handler,
        }
    }

    pub async fn run(self, ctx: Context) -> Result<(), Error> {
        let handler = self.handler;
        forward(&ctx, self.subscription, "relative humidity", |value| {
            let handler = Arc::clone(&handler);
            let ctx = ctx.clone();
            async move { handler.handle_relative_humidity(&ctx, value).await }
        })
        .await
    }
}

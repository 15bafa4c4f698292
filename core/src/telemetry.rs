//! # Telemetry: Observability Decorators
//!
//! This module provides a decorator for adding tracing to any `Handler`.

use crate::bus::Bus;
use crate::handler::Handler;
use crate::params::Params;
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use tracing::{Instrument, info_span};

/// A wrapper Handler that adds telemetry (tracing) to every lifecycle hook
/// of the inner Handler.
#[derive(Clone)]
pub struct Traced<H> {
    inner: H,
}

impl<H: Handler> Traced<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }

    async fn hook<T, F>(&self, hook: &'static str, fut: F) -> anyhow::Result<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        let span = info_span!("Hook", segue.handler = %self.inner.name(), segue.hook = hook);

        async move {
            let start = std::time::Instant::now();
            let result = fut.await;
            let duration = start.elapsed();
            match &result {
                Ok(_) => tracing::debug!(?duration, "Hook completed"),
                Err(e) => tracing::error!(error = %e, ?duration, "Hook failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl<H: Handler> Handler for Traced<H> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn before_model(&self, bus: &mut Bus) -> anyhow::Result<()> {
        self.hook("before_model", self.inner.before_model(bus)).await
    }

    async fn model(&self, params: &Params, bus: &mut Bus) -> anyhow::Result<Value> {
        self.hook("model", self.inner.model(params, bus)).await
    }

    async fn after_model(&self, context: &Value, bus: &mut Bus) -> anyhow::Result<()> {
        self.hook("after_model", self.inner.after_model(context, bus)).await
    }

    async fn redirect(&self, context: &Value, bus: &mut Bus) -> anyhow::Result<()> {
        self.hook("redirect", self.inner.redirect(context, bus)).await
    }

    fn serialize(&self, context: &Value, names: &[String]) -> Params {
        self.inner.serialize(context, names)
    }
}

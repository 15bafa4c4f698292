use crate::bus::Bus;
use crate::params::{Params, params_from_object};
use async_trait::async_trait;
use serde_json::Value;

/// The contract for a route handler.
///
/// A handler owns the lifecycle hooks of one segment. The resolver only
/// ever calls them; every hook except [`Handler::name`] has a default, so a
/// handler that does not care about redirects simply does not override
/// [`Handler::redirect`].
///
/// # Example
/// ```rust,ignore
/// struct PostHandler { repo: PostRepo }
///
/// #[async_trait]
/// impl Handler for PostHandler {
///     fn name(&self) -> &str { "post" }
///
///     async fn model(&self, params: &Params, _bus: &mut Bus) -> anyhow::Result<Value> {
///         let id = params.get("post_id").context("missing post_id")?;
///         Ok(serde_json::to_value(self.repo.find(id).await?)?)
///     }
/// }
/// ```
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Identifier used in logs and spans.
    fn name(&self) -> &str;

    async fn before_model(&self, _bus: &mut Bus) -> anyhow::Result<()> {
        Ok(())
    }

    /// Produce the segment context from its params. Defaults to the params themselves.
    async fn model(&self, params: &Params, _bus: &mut Bus) -> anyhow::Result<Value> {
        Ok(serde_json::to_value(params)?)
    }

    async fn after_model(&self, _context: &Value, _bus: &mut Bus) -> anyhow::Result<()> {
        Ok(())
    }

    /// Fired once per newly resolved segment. May start a competing transition.
    async fn redirect(&self, _context: &Value, _bus: &mut Bus) -> anyhow::Result<()> {
        Ok(())
    }

    /// Derive URL params from a context object supplied up front.
    fn serialize(&self, context: &Value, names: &[String]) -> Params {
        params_from_object(context, names)
    }
}

use segue_core::ResolverConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install a stdout tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `config.log_filter` is used. A
/// subscriber that is already installed (e.g. by another test) is left alone.
pub fn init_tracing(config: &ResolverConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))?;

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok();

    if !installed {
        tracing::debug!("Tracing subscriber already installed");
    }
    Ok(())
}

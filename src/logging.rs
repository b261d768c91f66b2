use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

fn default_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy()
}

/// Default human-readable subscriber, honouring `RUST_LOG` overrides and
/// defaulting to `INFO`. Returned uninstalled so hosts can compose it with
/// their own layers or scope it with `tracing::subscriber::with_default`.
pub fn subscriber() -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::registry()
        .with(default_filter())
        .with(tracing_subscriber::fmt::layer())
}

/// Default JSON subscriber with flattened event fields, for hosts that ship
/// logs to structured collectors.
pub fn json_subscriber() -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::registry()
        .with(default_filter())
        .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
}

/// Install [`subscriber`] as the global default.
pub fn init_logging() {
    subscriber().init()
}

/// Install [`json_subscriber`] as the global default.
pub fn init_json_logging() {
    json_subscriber().init()
}

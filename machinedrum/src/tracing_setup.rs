use std::sync::Arc;

use parking_lot::Mutex;
use tracing::Level;
use tracing_core::LevelFilter;
use tracing_error::ErrorLayer;
use tracing_subscriber::{layer::SubscriberExt, reload, EnvFilter, Layer};

use crate::ReloadHandle;

pub const LOG_ENV_VAR: &str = "MACHINEDRUM_LOG";

pub struct LoggingState {
    pub reload_handle: ReloadHandle,
    pub active_level: Mutex<tracing::Level>,
}

pub fn get_default_env_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy()
}

/// Builds the subscriber a session logs through. Nothing is installed globally, the
/// session enters it with `tracing::subscriber::with_default`.
pub fn setup_logging() -> (
    Arc<dyn tracing::Subscriber + Send + Sync + 'static>,
    Arc<LoggingState>,
) {
    let (env_filter, reload_handle) =
        reload::Layer::<EnvFilter, tracing_subscriber::Registry>::new(get_default_env_filter());

    let logging_state = Arc::new(LoggingState {
        reload_handle,
        active_level: Mutex::new(Level::INFO),
    });

    let fmt_layer = tracing_subscriber::fmt::layer().pretty().boxed();
    let layers = env_filter.boxed().and_then(fmt_layer).boxed();

    let registry = tracing_subscriber::registry()
        .with(layers)
        .with(ErrorLayer::default());

    (Arc::new(registry), logging_state)
}

// Logging/tracing setup

use countylake_config::{LogFormat, ServerConfig};

/// Install the global tracing subscriber from the server configuration
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(server: &ServerConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // RUST_LOG wins over the configured level
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&server.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    let _ = match server.log_format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Text => registry.with(fmt::layer()).try_init(),
    };
}

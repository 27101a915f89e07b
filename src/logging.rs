//! Tracing subscriber setup shared by the binaries.

use tracing_subscriber::{
    fmt::MakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::config::LoggingConfig;

/// Build the filter: `RUST_LOG` wins, otherwise the configured level for this crate
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(config))
}

fn default_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::new(format!(
        "popchart={},tower_http={}",
        config.level, config.level
    ))
}

/// Install the global subscriber, logging to stdout
///
/// `format = "json"` selects the JSON formatter; anything else is the
/// human-readable one.
pub fn init(config: &LoggingConfig) {
    install(config, std::io::stdout);
}

/// Install the global subscriber, logging to stderr so stdout stays clean
/// for command output
pub fn init_stderr(config: &LoggingConfig) {
    install(config, std::io::stderr);
}

fn install<W>(config: &LoggingConfig, writer: W)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let registry = tracing_subscriber::registry().with(env_filter(config));

    if config.format.eq_ignore_ascii_case("json") {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(writer),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(writer))
            .init();
    }
}

//! Logging and tracing utilities

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "warn,screen_core=info";

/// Shape of emitted log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Build the filter from `RUST_LOG`, falling back to `default_filter`
pub fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Initialize the tracing subscriber.
///
/// Logs go to stderr so stdout stays clean for rendered results.
pub fn init_tracing(format: LogFormat) {
    let registry = tracing_subscriber::registry().with(env_filter(DEFAULT_FILTER));

    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        let filter = EnvFilter::try_new(DEFAULT_FILTER).unwrap();
        assert!(filter.to_string().contains("screen_core=info"));
    }
}

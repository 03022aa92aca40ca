//! Logging bootstrap.

use tracing_subscriber::EnvFilter;

use crate::config::{defaults, env_vars};

/// Install the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` when set. JSON output is selected with
/// `ZWSYNC_LOG_JSON=true`. Calling this twice is harmless; the second call
/// leaves the first subscriber in place.
pub fn init() {
    let json_logging = std::env::var(env_vars::LOG_JSON)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);
    init_with(json_logging);
}

/// Install the global tracing subscriber with an explicit output format.
pub fn init_with(json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(defaults::LOG_FILTER));

    let result = if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .try_init()
    };

    if let Err(e) = result {
        tracing::debug!("tracing subscriber already installed: {}", e);
    }
}

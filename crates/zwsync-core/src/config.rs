//! Configuration defaults and environment overrides.
//!
//! All tunables used by the synchronization engine live here so that the
//! device crate never reads the environment directly.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default values.
pub mod defaults {
    /// Log unmatched non-user values on `valueAdded`.
    pub const DEBUG: bool = false;
    /// How long a pending write waits for the hardware to confirm it.
    pub const DEFERRED_WRITE_TIMEOUT_MS: u64 = 30_000;
    /// Default tracing filter when `RUST_LOG` is unset.
    pub const LOG_FILTER: &str = "zwsync=info";
}

/// Environment variable names.
pub mod env_vars {
    pub const DEBUG: &str = "ZWSYNC_DEBUG";
    pub const DEFERRED_WRITE_TIMEOUT_MS: &str = "ZWSYNC_DEFERRED_WRITE_TIMEOUT_MS";
    pub const LOG_JSON: &str = "ZWSYNC_LOG_JSON";
}

/// Runtime configuration for node synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// When set, `valueAdded` logs every unmatched value, not just user-genre ones.
    pub debug: bool,
    /// Upper bound on how long a deferred write waits for confirmation.
    #[serde(with = "duration_ms")]
    pub deferred_write_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debug: defaults::DEBUG,
            deferred_write_timeout: Duration::from_millis(defaults::DEFERRED_WRITE_TIMEOUT_MS),
        }
    }
}

impl SyncConfig {
    /// Read overrides from the process environment, falling back to defaults.
    pub fn from_env() -> crate::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    ///
    /// Unset keys keep their default; set keys that fail to parse are an error.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(env_vars::DEBUG) {
            config.debug = parse_bool(&raw).ok_or_else(|| {
                crate::config_err!("{} must be a boolean, got {:?}", env_vars::DEBUG, raw)
            })?;
        }

        if let Some(raw) = lookup(env_vars::DEFERRED_WRITE_TIMEOUT_MS) {
            let ms: u64 = raw.trim().parse().map_err(|_| {
                crate::config_err!(
                    "{} must be a number of milliseconds, got {:?}",
                    env_vars::DEFERRED_WRITE_TIMEOUT_MS,
                    raw
                )
            })?;
            if ms == 0 {
                return Err(crate::config_err!(
                    "{} must be greater than zero",
                    env_vars::DEFERRED_WRITE_TIMEOUT_MS
                ));
            }
            config.deferred_write_timeout = Duration::from_millis(ms);
        }

        Ok(config)
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_deferred_write_timeout(mut self, timeout: Duration) -> Self {
        self.deferred_write_timeout = timeout;
        self
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

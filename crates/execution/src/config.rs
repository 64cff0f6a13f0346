//! Runtime configuration for capture runs.

use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Configuration for the capture service and its stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    /// How long recent captures stay cached for history lookups.
    pub cache_ttl_secs: u64,
    /// Captures retained by the in-memory store.
    pub max_captures: usize,
    /// Recent captures scanned when looking for the previous snapshot.
    pub history_limit: usize,
    /// Default age cut-off for pruning.
    pub retention_days: i64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 30,
            max_captures: 1000,
            history_limit: 50,
            retention_days: 30,
        }
    }
}

impl CaptureConfig {
    /// Defaults overridden by `LP_WATCH_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each key.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        override_with(&lookup, "LP_WATCH_CACHE_TTL_SECS", &mut config.cache_ttl_secs);
        override_with(&lookup, "LP_WATCH_MAX_CAPTURES", &mut config.max_captures);
        override_with(&lookup, "LP_WATCH_HISTORY_LIMIT", &mut config.history_limit);
        override_with(&lookup, "LP_WATCH_RETENTION_DAYS", &mut config.retention_days);
        config
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn override_with<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(_) => warn!(key, value = %raw, "Ignoring invalid configuration value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_lookup_overrides_defaults() {
        let vars: HashMap<&str, &str> = [
            ("LP_WATCH_CACHE_TTL_SECS", "5"),
            ("LP_WATCH_HISTORY_LIMIT", "not-a-number"),
            ("LP_WATCH_RETENTION_DAYS", " 7 "),
        ]
        .into_iter()
        .collect();

        let config = CaptureConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.cache_ttl(), Duration::from_secs(5));
        assert_eq!(config.max_captures, 1000);
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.retention_days, 7);
    }
}

use std::env;
use std::time::Duration;

/// Settings for a [`FreshnessCache`](crate::FreshnessCache), parsed from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreshnessConfig {
    /// How long a successful read is served from memory
    pub ttl: Duration,
    /// Soft bound on resident entries; 0 means unbounded
    pub max_entries: usize,
}

impl FreshnessConfig {
    /// Parse `OBJECT_CACHE_TTL_SECS` and `OBJECT_CACHE_MAX_ENTRIES`, falling
    /// back to the defaults for unset or unparsable values
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let ttl = env::var("OBJECT_CACHE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.ttl);

        let max_entries = env::var("OBJECT_CACHE_MAX_ENTRIES")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.max_entries);

        Self { ttl, max_entries }
    }
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300), // 5 minutes
            max_entries: 10_000,
        }
    }
}

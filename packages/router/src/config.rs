//! Router configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable overriding [`RouterConfig::open_timeout`], in
/// milliseconds.
pub const OPEN_TIMEOUT_ENV: &str = "ROWMAP_OPEN_TIMEOUT_MS";

/// Default bound on a readiness wait.
pub const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings for a [`StoreRouter`](crate::StoreRouter).
///
/// ```json
/// { "open_timeout_ms": 5000 }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// How long an operation waits for an asynchronously opening store.
    #[serde(rename = "open_timeout_ms", with = "millis")]
    pub open_timeout: Duration,
}

impl RouterConfig {
    /// Defaults, with `ROWMAP_OPEN_TIMEOUT_MS` applied if it is set.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `ROWMAP_OPEN_TIMEOUT_MS` on top of this configuration.
    ///
    /// An unparsable value is logged and ignored.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(raw) = std::env::var(OPEN_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.open_timeout = Duration::from_millis(ms),
                Err(e) => tracing::warn!(
                    var = OPEN_TIMEOUT_ENV,
                    value = %raw,
                    error = %e,
                    "ignoring invalid open timeout"
                ),
            }
        }
        self
    }

    #[must_use]
    pub fn with_open_timeout(mut self, open_timeout: Duration) -> Self {
        self.open_timeout = open_timeout;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            open_timeout: DEFAULT_OPEN_TIMEOUT,
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

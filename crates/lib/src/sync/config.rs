//! Tunables for the sync layer.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing configuration for [`SyncCoordinator`](super::SyncCoordinator) and
/// the login flow.
///
/// Durations are (de)serialized as integer milliseconds; missing fields take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
    /// Upper bound on a login's registry convergence wait.
    #[serde(with = "millis")]
    pub registry_timeout: Duration,
    /// How long to wait for the remote channel to become reachable at all.
    #[serde(with = "millis")]
    pub reachability_timeout: Duration,
    /// Interval between registry re-fetches while converging.
    #[serde(with = "millis")]
    pub poll_interval: Duration,
    /// Interval between reachability probes.
    #[serde(with = "millis")]
    pub reachability_poll: Duration,
    /// Bound on a single remote document fetch.
    #[serde(with = "millis")]
    pub fetch_timeout: Duration,
    /// Pause before a discovery fetch, giving the remote channel time to settle.
    #[serde(with = "millis")]
    pub discovery_settle: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            registry_timeout: Duration::from_secs(8),
            reachability_timeout: Duration::from_secs(4),
            poll_interval: Duration::from_secs(1),
            reachability_poll: Duration::from_millis(200),
            fetch_timeout: Duration::from_secs(5),
            discovery_settle: Duration::from_secs(1),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

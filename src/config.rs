//! Runtime rule configuration.

use chrono::TimeDelta;

use crate::constants::DEFAULT_LOCK_TIMEOUT_SECS;

/// Tunables the rules engine reads at run time.
///
/// The region radius is not configurable; see [`crate::constants::REGION_RADIUS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RulesConfig {
    /// How long a time-limited stone may hold its region before the sweep
    /// unlocks it.
    pub lock_timeout: TimeDelta,
}

impl RulesConfig {
    /// Rules with a lock timeout of `secs` seconds, saturating at the largest
    /// representable duration.
    pub fn with_timeout_secs(secs: u64) -> Self {
        let secs = i64::try_from(secs).unwrap_or(i64::MAX);
        Self {
            lock_timeout: TimeDelta::try_seconds(secs).unwrap_or(TimeDelta::MAX),
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self::with_timeout_secs(DEFAULT_LOCK_TIMEOUT_SECS)
    }
}

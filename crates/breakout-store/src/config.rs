use std::time::Duration;

use breakout_analysis::bucket::BucketPolicy;
use serde::{Deserialize, Serialize};

/// Tuning knobs of a [`BreakoutStore`](crate::BreakoutStore).
///
/// Every field has a default, so a partial JSON document is a valid config.
///
/// ```
/// # use breakout_store::StoreConfig;
/// let config: StoreConfig =
///     serde_json::from_str(r#"{ "throttle_ms": 50, "bucket_policy": { "quantitative_bins": 8 } }"#)?;
/// assert_eq!(config.throttle_interval().as_millis(), 50);
/// assert_eq!(config.bucket_policy.quantitative_bins, 8);
/// assert_eq!(config.bucket_policy.max_categories, 24);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Minimum interval between two runs of the analyzers, in milliseconds.
    pub throttle_ms: u64,
    pub bucket_policy: BucketPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            throttle_ms: 200,
            bucket_policy: BucketPolicy::default(),
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

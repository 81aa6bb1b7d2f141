//! Delivery queue pacing configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Pacing of the delivery queue drain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Minimum time between two consecutive deliveries.
    #[serde(default = "default_min_interval")]
    pub min_interval_ms: u64,
    /// Pause after each delivery before the next item is considered.
    #[serde(default = "default_settle_interval")]
    pub settle_interval_ms: u64,
    /// Pending length above which a backlog warning is logged.
    #[serde(default = "default_backlog_warn")]
    pub backlog_warn_threshold: usize,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: default_min_interval(),
            settle_interval_ms: default_settle_interval(),
            backlog_warn_threshold: default_backlog_warn(),
        }
    }
}

impl DeliveryConfig {
    /// Minimum inter-delivery interval.
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    /// Post-delivery settle interval.
    pub fn settle_interval(&self) -> Duration {
        Duration::from_millis(self.settle_interval_ms)
    }
}

fn default_min_interval() -> u64 {
    2000
}

fn default_settle_interval() -> u64 {
    500
}

fn default_backlog_warn() -> usize {
    100
}

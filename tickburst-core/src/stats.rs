use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Aggregated counts for one burst.
///
/// `total == success + throttled + other` always holds, and the per-code `errors` breakdown sums
/// to `throttled + other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub stream: String,
    pub tick: u32,
    pub total: u64,
    pub success: u64,
    pub throttled: u64,
    pub other: u64,
    pub errors: BTreeMap<String, u64>,
    pub latency: Option<LatencySummary>,
}

impl Summary {
    pub fn empty(stream: &str, tick: u32) -> Self {
        Self {
            stream: stream.to_string(),
            tick,
            total: 0,
            success: 0,
            throttled: 0,
            other: 0,
            errors: BTreeMap::new(),
            latency: None,
        }
    }

    pub fn failed(&self) -> u64 {
        self.throttled + self.other
    }

    pub fn throttle_rate(&self) -> f64 {
        if self.total == 0 {
            0.
        } else {
            self.throttled as f64 / self.total as f64
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.total == self.success + self.throttled + self.other
            && self.errors.values().sum::<u64>() == self.failed()
    }
}

/// Latency distribution of the attempts in one burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub min: Duration,
    pub max: Duration,
    pub p50: Duration,
    pub p90: Duration,
    pub p99: Duration,
}

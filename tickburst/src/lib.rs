#![cfg_attr(docsrs, feature(doc_cfg))]
//! Time-aligned concurrent burst scheduler.
//!
//! Tickburst characterizes how a rate-limited remote service throttles. Each run is a fixed
//! number of one-second ticks aligned to wall-clock boundaries; every tick fires one burst of
//! concurrent attempts per stream, waits for all of them, and classifies the outcomes into
//! success, throttled and other-error counts.

pub mod classifier;
pub mod executor;
pub mod operation;
pub mod report;
pub mod retry;
pub mod scheduler;

mod timer;

pub use classifier::summarize;
pub use executor::execute;
pub use operation::{Classify, Operation};
pub use report::{JsonReporter, LogReporter, Reporter, TableReporter};
pub use retry::{attempt_with, NoRetry, RetryPolicy};
pub use scheduler::{RunReport, ScheduleError, TickReport, TickScheduler};
pub use tickburst_core::*;
pub use time::UtcOffset;

/// Counter of attempts, labelled by `stream` and `class`.
pub const ATTEMPTS_METRIC: &str = "tickburst_attempts_total";

/// Histogram of attempt latency in seconds, labelled by `stream`.
pub const LATENCY_METRIC: &str = "tickburst_attempt_latency_seconds";

use std::time::Duration;

/// Length of one scheduling tick. Ticks are aligned to wall-clock second boundaries.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Error code the remote service uses to signal a rate-limit rejection.
pub const THROTTLING_CODE: &str = "ThrottlingException";

/// Sentinel code for failures that carry no classifiable error code.
pub const UNKNOWN_CODE: &str = "unknown";

/// Sentinel code for attempts whose task panicked before producing a result.
pub const PANIC_CODE: &str = "panic";

pub const DEFAULT_TICKS: u32 = 1;

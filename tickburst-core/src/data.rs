use crate::{THROTTLING_CODE, UNKNOWN_CODE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant, SystemTime};

/// Classified result of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    Success,
    Throttled,
    Other(String),
}

impl Classification {
    /// Classify a failure from the error code the remote attached to it, if any.
    ///
    /// Failures without a code land in `Other` with the [`UNKNOWN_CODE`] sentinel so that
    /// aggregation never has to reject an outcome.
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some(THROTTLING_CODE) => Classification::Throttled,
            Some(code) if !code.is_empty() => Classification::Other(code.to_string()),
            _ => Classification::Other(UNKNOWN_CODE.to_string()),
        }
    }

    /// Re-derive the bucket from the code, so an `Other` carrying the throttling code (or no
    /// code at all) lands where [`Classification::from_code`] would put it.
    pub fn normalized(&self) -> Self {
        match self {
            Classification::Success => Classification::Success,
            failure => Classification::from_code(failure.code()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Classification::Success)
    }

    pub fn is_throttled(&self) -> bool {
        matches!(self, Classification::Throttled)
    }

    /// Error code for failed attempts, `None` on success.
    pub fn code(&self) -> Option<&str> {
        match self {
            Classification::Success => None,
            Classification::Throttled => Some(THROTTLING_CODE),
            Classification::Other(code) => Some(code.as_str()),
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code() {
            None => write!(f, "success"),
            Some(code) => write!(f, "{code}"),
        }
    }
}

/// The timed result of one attempt within a burst.
///
/// `start` and `end` are monotonic; `started_at` is the wall-clock stamp of `start` and is only
/// used for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub start: Instant,
    pub end: Instant,
    pub started_at: SystemTime,
    pub classification: Classification,
}

impl Outcome {
    pub fn new(
        start: Instant,
        end: Instant,
        started_at: SystemTime,
        classification: Classification,
    ) -> Self {
        let end = end.max(start);
        Self {
            start,
            end,
            started_at,
            classification,
        }
    }

    pub fn latency(&self) -> Duration {
        self.end.saturating_duration_since(self.start)
    }

    /// Wall-clock stamp of `end`.
    pub fn ended_at(&self) -> SystemTime {
        self.started_at + self.latency()
    }
}

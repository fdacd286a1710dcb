//! Transport retry policy.
//!
//! Throttling counts are only meaningful when every attempt is exactly one network-level try,
//! so remote clients must drive their calls through a policy and the probe only ever hands them
//! [`NoRetry`].
use std::future::Future;
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, trace};

pub trait RetryPolicy: Send + Sync {
    fn max_retries(&self) -> u32;

    /// Delay before retry number `attempt` (0-based).
    fn delay(&self, attempt: u32) -> Duration;

    fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries()
    }
}

/// Zero retries, zero delay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn max_retries(&self) -> u32 {
        0
    }

    fn delay(&self, _attempt: u32) -> Duration {
        Duration::ZERO
    }

    fn should_retry(&self, _attempt: u32) -> bool {
        false
    }
}

/// Drive `func` under `policy`, returning the first success or the last error.
pub async fn attempt_with<P, T, F, R, E>(policy: &P, mut func: T) -> Result<R, E>
where
    P: RetryPolicy + ?Sized,
    T: FnMut() -> F,
    F: Future<Output = Result<R, E>>,
{
    let mut attempt = 0;
    loop {
        match func().await {
            Ok(res) => return Ok(res),
            Err(_) if policy.should_retry(attempt) => {
                let delay = policy.delay(attempt);
                attempt += 1;
                trace!("Retrying call, attempt={attempt}, delay={delay:?}");
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            Err(err) => return Err(err),
        }
    }
}

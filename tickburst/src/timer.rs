use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Fires on wall-clock boundaries of `period`, starting with the first boundary after creation.
pub(crate) struct TickTimer {
    interval: Interval,
    period: Duration,
}

impl TickTimer {
    pub fn aligned(period: Duration) -> Self {
        let delay = until_next_boundary(SystemTime::now(), period);
        trace!("First tick in {}", humantime::format_duration(delay));
        let mut interval = interval_at(Instant::now() + delay, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval, period }
    }

    /// Wait for the next boundary and return it.
    ///
    /// A boundary that already passed while the caller was busy is dropped rather than fired
    /// late, so an overrunning tick realigns on the following boundary.
    pub async fn tick(&mut self) -> Instant {
        loop {
            let asked = Instant::now();
            let tick = self.interval.tick().await;
            if tick >= asked {
                return tick;
            }
            warn!(
                "Previous tick overran by {}; waiting for the next boundary",
                humantime::format_duration(asked - tick)
            );
        }
    }
}

impl std::fmt::Display for TickTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", humantime::format_duration(self.period))
    }
}

/// Time from `now` until the next multiple of `period` since the Unix epoch. A `now` exactly on a
/// boundary waits a full period.
pub(crate) fn until_next_boundary(now: SystemTime, period: Duration) -> Duration {
    let period_nanos = period.as_nanos().max(1);
    let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
    let remaining = period_nanos - since_epoch % period_nanos;
    Duration::from_nanos(remaining as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn waits_until_next_second() {
        let now = UNIX_EPOCH + Duration::from_millis(1_700_000_000_250);
        assert_eq!(until_next_boundary(now, SECOND), Duration::from_millis(750));
    }

    #[test]
    fn on_boundary_waits_full_period() {
        let now = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert_eq!(until_next_boundary(now, SECOND), SECOND);
    }

    #[test]
    fn never_exceeds_period() {
        for millis in [0, 1, 499, 999] {
            let now = UNIX_EPOCH + Duration::from_secs(42) + Duration::from_millis(millis);
            let wait = until_next_boundary(now, SECOND);
            assert!(wait > Duration::ZERO && wait <= SECOND);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_are_one_period_apart() {
        let mut timer = TickTimer::aligned(SECOND);
        let first = timer.tick().await;
        let second = timer.tick().await;
        assert_eq!(second - first, SECOND);
        assert_eq!(timer.to_string(), "1s");
    }

    #[tracing_test::traced_test]
    #[tokio::test(start_paused = true)]
    async fn overrun_realigns_to_boundary() {
        let mut timer = TickTimer::aligned(SECOND);
        let first = timer.tick().await;
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        let second = timer.tick().await;
        assert_eq!(second - first, 2 * SECOND);
        assert!(logs_contain("overran"));
    }

    #[tokio::test(start_paused = true)]
    async fn long_overrun_skips_every_missed_boundary() {
        let mut timer = TickTimer::aligned(SECOND);
        let first = timer.tick().await;
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        let second = timer.tick().await;
        let third = timer.tick().await;
        assert_eq!(second - first, 3 * SECOND);
        assert_eq!(third - second, SECOND);
    }
}

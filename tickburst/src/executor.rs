use crate::operation::{Operation, Timed};
use metrics_util::AtomicBucket;
use std::sync::Arc;
use std::time::SystemTime;
use tickburst_core::{Classification, Outcome, PANIC_CODE};
use tokio::time::Instant;
#[allow(unused)]
use tracing::{debug, error, instrument, trace, warn};

/// Run `n` concurrent attempts of `op` and wait for every one of them.
///
/// Each attempt is its own task and calls the operation exactly once. Attempt failures are
/// captured in the returned outcomes, never propagated. The returned collection is unordered and
/// always holds exactly `n` entries, including for attempts whose task panicked.
#[instrument(name = "burst", skip(op))]
pub async fn execute(stream: &str, op: &Operation, n: usize) -> Vec<Outcome> {
    if n == 0 {
        return vec![];
    }

    let launched = Instant::now();
    let bucket = Arc::new(AtomicBucket::new());
    let mut handles = Vec::with_capacity(n);
    for _ in 0..n {
        let op = op.clone();
        let bucket = bucket.clone();
        handles.push(tokio::spawn(async move {
            let (classification, timing) = Timed::new(op.attempt()).await;
            bucket.push(Outcome::new(
                timing.start.into_std(),
                timing.end.into_std(),
                timing.started_at,
                classification,
            ));
        }));
    }

    let mut lost = 0;
    for handle in handles {
        if let Err(err) = handle.await {
            error!("Attempt task failed: {err}");
            lost += 1;
        }
    }

    let mut outcomes = Vec::with_capacity(n);
    bucket.clear_with(|chunk| outcomes.extend_from_slice(chunk));

    let now = Instant::now();
    for _ in 0..lost {
        outcomes.push(Outcome::new(
            launched.into_std(),
            now.into_std(),
            SystemTime::now(),
            Classification::Other(PANIC_CODE.to_string()),
        ));
    }

    debug_assert_eq!(outcomes.len(), n);
    trace!(
        "Burst finished in {}",
        humantime::format_duration(now - launched)
    );

    #[cfg(feature = "metrics")]
    record_metrics(stream, &outcomes);

    outcomes
}

#[cfg(feature = "metrics")]
fn record_metrics(stream: &str, outcomes: &[Outcome]) {
    for outcome in outcomes {
        let class = match outcome.classification {
            Classification::Success => "success",
            Classification::Throttled => "throttled",
            Classification::Other(_) => "other",
        };
        metrics::counter!(
            crate::ATTEMPTS_METRIC,
            "stream" => stream.to_string(),
            "class" => class
        )
        .increment(1);
        metrics::histogram!(crate::LATENCY_METRIC, "stream" => stream.to_string())
            .record(outcome.latency().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counting_op(calls: Arc<AtomicUsize>) -> Operation {
        Operation::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                tokio::task::yield_now().await;
                Ok::<_, Classification>(())
            }
        })
    }

    #[tokio::test]
    async fn zero_concurrency_returns_immediately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let outcomes = execute("read", &counting_op(calls.clone()), 0).await;
        assert!(outcomes.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn collects_exactly_n_outcomes() {
        for n in [1, 20, 1000] {
            let calls = Arc::new(AtomicUsize::new(0));
            let outcomes = execute("read", &counting_op(calls.clone()), n).await;
            assert_eq!(outcomes.len(), n);
            assert_eq!(calls.load(Ordering::SeqCst), n);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    #[ntest::timeout(30000)]
    async fn collects_exactly_n_outcomes_in_parallel() {
        let calls = Arc::new(AtomicUsize::new(0));
        let op = {
            let calls = calls.clone();
            Operation::new(move || {
                let idx = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    tokio::time::sleep(Duration::from_micros((idx % 7) as u64 * 100)).await;
                    if idx % 3 == 0 {
                        Err(Classification::Throttled)
                    } else {
                        Ok(())
                    }
                }
            })
        };

        for _ in 0..5 {
            let outcomes = execute("create", &op, 1000).await;
            assert_eq!(outcomes.len(), 1000);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 5000);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_slowest_attempt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let op = {
            let calls = calls.clone();
            Operation::new(move || {
                let idx = calls.fetch_add(1, Ordering::SeqCst) as u64;
                async move {
                    tokio::time::sleep(Duration::from_millis(100 * idx)).await;
                    Ok::<_, Classification>(())
                }
            })
        };

        let start = Instant::now();
        let outcomes = execute("read", &op, 5).await;
        assert_eq!(outcomes.len(), 5);
        assert!(start.elapsed() >= Duration::from_millis(400));
        assert!(outcomes.iter().all(|o| o.end >= o.start));

        let mut latencies: Vec<_> = outcomes.iter().map(Outcome::latency).collect();
        latencies.sort();
        assert_eq!(latencies[4], Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn attempts_run_in_parallel() {
        let op = Operation::new(|| async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok::<_, Classification>(())
        });

        let start = Instant::now();
        let outcomes = execute("read", &op, 50).await;
        let elapsed = start.elapsed();

        assert_eq!(outcomes.len(), 50);
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(200), "attempts ran serially: {elapsed:?}");
    }

    #[tokio::test]
    async fn failures_are_isolated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let op = {
            let calls = calls.clone();
            Operation::new(move || {
                let idx = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    match idx % 3 {
                        0 => Ok(()),
                        1 => Err(Classification::Throttled),
                        _ => Err(Classification::Other("InternalServerError".to_string())),
                    }
                }
            })
        };

        let outcomes = execute("create", &op, 30).await;
        let count = |c: Classification| outcomes.iter().filter(|o| o.classification == c).count();
        assert_eq!(count(Classification::Success), 10);
        assert_eq!(count(Classification::Throttled), 10);
        assert_eq!(
            count(Classification::Other("InternalServerError".to_string())),
            10
        );
    }

    #[tokio::test]
    async fn panicking_attempt_keeps_count() {
        let calls = Arc::new(AtomicUsize::new(0));
        let op = {
            let calls = calls.clone();
            Operation::new(move || {
                let idx = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if idx == 3 {
                        panic!("attempt blew up");
                    }
                    Ok::<_, Classification>(())
                }
            })
        };

        let outcomes = execute("read", &op, 8).await;
        assert_eq!(outcomes.len(), 8);
        let panicked = outcomes
            .iter()
            .filter(|o| o.classification == Classification::Other("panic".to_string()))
            .count();
        assert_eq!(panicked, 1);
    }
}

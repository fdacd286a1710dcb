use pdatastructs::tdigest::{TDigest, K1};
use std::time::Duration;
use tickburst_core::{LatencySummary, Outcome, Summary};
use tracing::error;

const TDIGEST_BACKLOG_SIZE: usize = 100;

/// Fold one burst's outcomes into a [`Summary`].
///
/// The outcome collection is treated as an unordered multiset: any permutation of the same
/// outcomes yields the same summary.
pub fn summarize(stream: &str, tick: u32, outcomes: &[Outcome]) -> Summary {
    let mut summary = Summary::empty(stream, tick);

    for outcome in outcomes {
        let classification = outcome.classification.normalized();
        summary.total += 1;
        if classification.is_success() {
            summary.success += 1;
        } else if classification.is_throttled() {
            summary.throttled += 1;
        } else {
            summary.other += 1;
        }

        if let Some(code) = classification.code() {
            *summary.errors.entry(code.to_string()).or_default() += 1;
        }
    }

    summary.latency = latency_summary(outcomes);
    summary
}

fn latency_summary(outcomes: &[Outcome]) -> Option<LatencySummary> {
    let mut latencies: Vec<Duration> = outcomes.iter().map(Outcome::latency).collect();
    latencies.sort_unstable();

    let min = *latencies.first()?;
    let max = *latencies.last()?;

    let mut digest = default_tdigest();
    for latency in &latencies {
        digest.insert(latency.as_secs_f64());
    }

    let quantile = |q: f64| {
        let secs = digest.quantile(q);
        // TDigest can produce NaN for degenerate inputs.
        if secs.is_finite() {
            Duration::from_secs_f64(secs.max(0.)).clamp(min, max)
        } else {
            error!("NaN latency quantile, falling back to max");
            max
        }
    };

    Some(LatencySummary {
        min,
        max,
        p50: quantile(0.5),
        p90: quantile(0.9),
        p99: quantile(0.99),
    })
}

fn default_tdigest() -> TDigest<K1> {
    TDigest::new(K1::new(10.), TDIGEST_BACKLOG_SIZE)
}

//! Rendering of per-burst summaries.
use std::fmt::Write;
use std::time::SystemTime;
use tickburst_core::{Outcome, Summary};
use time::{macros::format_description, OffsetDateTime, UtcOffset};
use tracing::{error, info};

/// Receives every summary the scheduler produces, in tick order.
pub trait Reporter: Send + Sync {
    fn report(&self, summary: &Summary);

    /// Raw outcomes of a burst, handed over right before its summary.
    fn outcomes(&self, _summary: &Summary, _outcomes: &[Outcome]) {}
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn report(&self, summary: &Summary) {
        (**self).report(summary)
    }

    fn outcomes(&self, summary: &Summary, outcomes: &[Outcome]) {
        (**self).outcomes(summary, outcomes)
    }
}

/// Plain text table on stdout.
#[derive(Debug, Clone, Copy)]
pub struct TableReporter {
    /// Append success/other counts and the per-code breakdown.
    pub detailed: bool,
    /// Print one line per attempt before each summary.
    pub verbose: bool,
    /// Offset used for per-attempt wall-clock stamps.
    pub offset: UtcOffset,
}

impl Default for TableReporter {
    fn default() -> Self {
        Self {
            detailed: false,
            verbose: false,
            offset: UtcOffset::UTC,
        }
    }
}

impl Reporter for TableReporter {
    fn report(&self, summary: &Summary) {
        println!("{}", render_summary(summary, self.detailed));
    }

    fn outcomes(&self, _summary: &Summary, outcomes: &[Outcome]) {
        if self.verbose {
            for (i, outcome) in outcomes.iter().enumerate() {
                println!("i={i}, r={}", render_outcome(outcome, self.offset));
            }
        }
    }
}

/// One structured log line per summary.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, summary: &Summary) {
        info!(
            stream = summary.stream,
            tick = summary.tick,
            throttle_rate = summary.throttle_rate(),
            "results summary, total={}, success={}, throttled={}, other={}, errors={:?}",
            summary.total,
            summary.success,
            summary.throttled,
            summary.other,
            summary.errors,
        );
    }
}

/// One JSON object per line.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReporter;

impl Reporter for JsonReporter {
    fn report(&self, summary: &Summary) {
        match serde_json::to_string(summary) {
            Ok(line) => println!("{line}"),
            Err(err) => error!("Unable to serialize summary: {err}"),
        }
    }
}

/// `| <name padded to 10> | total=<3-digit> | throttled=<3-digit>`
pub fn render_summary(summary: &Summary, detailed: bool) -> String {
    let mut line = format!(
        "| {:<10} | total={:03} | throttled={:03}",
        summary.stream, summary.total, summary.throttled
    );

    if detailed {
        let _ = write!(
            line,
            " | success={:03} | other={:03}",
            summary.success, summary.other
        );
        if let Some(latency) = summary.latency {
            let _ = write!(
                line,
                " | p50={:?} | p99={:?}",
                latency.p50, latency.p99
            );
        }
        for (code, count) in &summary.errors {
            let _ = write!(line, " | {code}={count}");
        }
    }

    line
}

/// `success=<bool>, err=<code>, start=HH:MM:SS.mmm, stop=HH:MM:SS.mmm`, with the stamps shifted
/// to `offset`. Callers wanting local time must resolve the offset themselves.
pub fn render_outcome(outcome: &Outcome, offset: UtcOffset) -> String {
    format!(
        "success={}, err={}, start={}, stop={}",
        outcome.classification.is_success(),
        outcome.classification.code().unwrap_or("none"),
        wall_clock(outcome.started_at, offset),
        wall_clock(outcome.ended_at(), offset),
    )
}

fn wall_clock(at: SystemTime, offset: UtcOffset) -> String {
    OffsetDateTime::from(at)
        .to_offset(offset)
        .format(format_description!(
            "[hour]:[minute]:[second].[subsecond digits:3]"
        ))
        .unwrap_or_else(|_| "??:??:??.???".to_string())
}

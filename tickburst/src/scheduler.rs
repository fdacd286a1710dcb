//! Tick scheduling
//!
//! A run is a fixed number of ticks aligned to wall-clock second boundaries. Every tick launches
//! one burst per active stream, all concurrently, and the next tick does not begin until every
//! burst of the current one has been summarized.
use crate::classifier::summarize;
use crate::executor::execute;
use crate::operation::Operation;
use crate::report::Reporter;
use crate::timer::TickTimer;
use std::collections::HashMap;
use std::time::Instant;
use thiserror::Error;
use tickburst_core::{ConfigError, Outcome, RunConfig, Summary, PANIC_CODE, TICK_INTERVAL};
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Invalid run configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("No operation registered for stream `{0}`")]
    MissingOperation(String),
}

/// Result of a whole run, one entry per tick in execution order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub ticks: Vec<TickReport>,
}

impl RunReport {
    pub fn summaries(&self) -> impl Iterator<Item = &Summary> {
        self.ticks.iter().flat_map(|t| t.summaries.iter())
    }

    pub fn stream<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Summary> + 'a {
        self.summaries().filter(move |s| s.stream == name)
    }
}

#[derive(Debug, Clone)]
pub struct TickReport {
    pub index: u32,
    /// The aligned boundary the tick was scheduled for.
    pub started: Instant,
    /// When the last burst of the tick was summarized.
    pub finished: Instant,
    /// In configured stream order; streams with a rate of zero are absent.
    pub summaries: Vec<Summary>,
}

#[derive(Clone)]
struct Burst {
    name: String,
    concurrency: usize,
    op: Operation,
}

/// Runs a [`RunConfig`] against registered stream operations.
///
/// # Example
/// ```no_run
/// use tickburst::{Classification, LogReporter, Operation, RunConfig, TickScheduler};
///
/// # async fn run() -> Result<(), tickburst::ScheduleError> {
/// let config = RunConfig::new().ticks(10).stream("read", 20);
/// let report = TickScheduler::new(config)
///     .operation("read", Operation::new(|| async { Ok::<_, Classification>(()) }))
///     .run(&LogReporter)
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct TickScheduler {
    config: RunConfig,
    operations: HashMap<String, Operation>,
}

impl TickScheduler {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            operations: HashMap::new(),
        }
    }

    /// Register the operation invoked by `stream`'s bursts.
    pub fn operation(mut self, stream: &str, op: Operation) -> Self {
        self.operations.insert(stream.to_string(), op);
        self
    }

    /// Execute every tick of the run.
    ///
    /// Only setup problems are errors, and they are reported before any attempt is made.
    /// Attempt failures end up in the summaries.
    #[instrument(name = "run", skip_all, fields(ticks = self.config.ticks))]
    pub async fn run<R>(self, reporter: &R) -> Result<RunReport, ScheduleError>
    where
        R: Reporter + ?Sized,
    {
        let bursts = self.bursts()?;
        info!("Running with config {:?}", &self.config);

        let mut report = RunReport::default();
        if self.config.ticks == 0 {
            return Ok(report);
        }

        let mut timer = TickTimer::aligned(TICK_INTERVAL);
        debug!("Tick interval {timer}");
        for index in 0..self.config.ticks {
            let started = timer.tick().await.into_std();
            trace!("Tick {index} started");

            let results = run_tick(index, &bursts).await;
            let finished = tokio::time::Instant::now().into_std();

            let mut summaries = Vec::with_capacity(results.len());
            for (summary, outcomes) in results {
                reporter.outcomes(&summary, &outcomes);
                reporter.report(&summary);
                summaries.push(summary);
            }

            report.ticks.push(TickReport {
                index,
                started,
                finished,
                summaries,
            });
        }

        info!("Run complete");
        Ok(report)
    }

    fn bursts(&self) -> Result<Vec<Burst>, ScheduleError> {
        self.config.validate()?;

        for name in self.operations.keys() {
            if self.config.rate(name).is_none() {
                warn!("Operation registered for unknown stream `{name}`");
            }
        }

        self.config
            .active_streams()
            .map(|stream| {
                let op = self
                    .operations
                    .get(&stream.name)
                    .ok_or_else(|| ScheduleError::MissingOperation(stream.name.clone()))?;
                Ok(Burst {
                    name: stream.name.clone(),
                    concurrency: stream.rate as usize,
                    op: op.clone(),
                })
            })
            .collect()
    }
}

/// Launch every burst of one tick concurrently and wait for all of them.
///
/// Every burst yields exactly one summary, even when its task is lost.
async fn run_tick(tick: u32, bursts: &[Burst]) -> Vec<(Summary, Vec<Outcome>)> {
    let handles: Vec<_> = bursts
        .iter()
        .map(|burst| {
            let name = burst.name.clone();
            let concurrency = burst.concurrency;
            let burst = burst.clone();
            let handle = tokio::spawn(
                async move {
                    let outcomes = execute(&burst.name, &burst.op, burst.concurrency).await;
                    let summary = summarize(&burst.name, tick, &outcomes);
                    (summary, outcomes)
                }
                .in_current_span(),
            );
            (name, concurrency, handle)
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (name, concurrency, handle) in handles {
        match handle.await {
            Ok(result) => results.push(result),
            Err(err) => {
                error!("Burst for stream `{name}` failed: {err}");
                results.push((lost_burst(&name, tick, concurrency), vec![]));
            }
        }
    }
    results
}

/// Summary for a burst whose task died: every attempt counts as a panic.
fn lost_burst(stream: &str, tick: u32, concurrency: usize) -> Summary {
    let n = concurrency as u64;
    let mut summary = Summary::empty(stream, tick);
    summary.total = n;
    summary.other = n;
    if n > 0 {
        summary.errors.insert(PANIC_CODE.to_string(), n);
    }
    summary
}

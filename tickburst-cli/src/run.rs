use crate::cli::{Cli, Format, ReadOp, CREATE_STREAM, READ_STREAM};
use crate::client::{create_network_op, list_networks_op, list_services_op, ControlPlaneClient};
use crate::error::SetupError;
use std::sync::Arc;
use tickburst::{
    JsonReporter, LogReporter, Reporter, RunConfig, RunReport, TableReporter, TickScheduler,
    UtcOffset,
};
use tracing::{info, instrument};

/// Connect to the control plane and run every tick of `config` against it.
#[instrument(name = "probe", skip_all, fields(endpoint = cli.endpoint))]
pub async fn run<R>(cli: &Cli, config: RunConfig, reporter: &R) -> Result<RunReport, SetupError>
where
    R: Reporter + ?Sized,
{
    let client = Arc::new(ControlPlaneClient::connect(&cli.endpoint).await?);

    let read = match cli.read_op {
        ReadOp::Networks => list_networks_op(client.clone()),
        ReadOp::Services => list_services_op(client.clone()),
    };
    let scheduler = TickScheduler::new(config)
        .operation(CREATE_STREAM, create_network_op(client))
        .operation(READ_STREAM, read);

    let report = scheduler.run(reporter).await?;

    let (total, throttled) = report
        .summaries()
        .fold((0, 0), |(t, th), s| (t + s.total, th + s.throttled));
    info!("Finished {} tick(s), {throttled}/{total} attempts throttled", report.ticks.len());
    Ok(report)
}

/// `offset` only affects the per-attempt stamps of the table format.
pub fn reporter(format: Format, verbose: bool, offset: UtcOffset) -> Box<dyn Reporter> {
    match format {
        Format::Table => Box::new(TableReporter {
            detailed: verbose,
            verbose,
            offset,
        }),
        Format::Log => Box::new(LogReporter),
        Format::Json => Box::new(JsonReporter),
    }
}

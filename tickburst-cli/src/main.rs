use anyhow::Context;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::io;
use tickburst::UtcOffset;
use tickburst_cli::run::reporter;
use tickburst_cli::{run, Cli};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_LOG_FILTER: &str = "tickburst=info,tickburst_cli=info";

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(io::stderr)
        .init();

    let config = cli.run_config(&mut io::stdin().lock(), &mut io::stderr())?;

    // Must be resolved while the process is still single-threaded.
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let reporter = reporter(cli.format, cli.verbose, offset);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Unable to start the async runtime")?;

    runtime.block_on(async {
        if let Some(addr) = cli.prometheus {
            PrometheusBuilder::new()
                .with_http_listener(addr)
                .install()
                .context("Unable to start the Prometheus exporter")?;
        }

        run(&cli, config, reporter.as_ref()).await?;
        Ok::<_, anyhow::Error>(())
    })
}

use crate::error::SetupError;
use clap::{Parser, ValueEnum};
use std::io::{BufRead, Write};
use std::net::SocketAddr;
use tickburst::{RunConfig, DEFAULT_TICKS};
use tracing::warn;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3002";

/// Stream that creates a resource on every attempt.
pub const CREATE_STREAM: &str = "create";

/// Stream that lists resources on every attempt.
pub const READ_STREAM: &str = "read";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReadOp {
    /// list-networks
    Networks,
    /// list-services
    Services,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Table,
    Log,
    Json,
}

/// Probe the throttling behavior of a rate-limited control plane.
///
/// Every tick (aligned to the wall-clock second) fires `--create-rate` concurrent create calls
/// and `--read-rate` concurrent read calls, without retries, and prints how many were throttled.
#[derive(Parser, Debug)]
#[command(name = "tickburst", version)]
pub struct Cli {
    /// Base URL of the control plane.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Number of one-second ticks to run.
    #[arg(short, long, default_value_t = DEFAULT_TICKS)]
    pub ticks: u32,

    /// Create attempts per tick.
    #[arg(short, long)]
    pub create_rate: Option<u32>,

    /// Read attempts per tick.
    #[arg(short, long)]
    pub read_rate: Option<u32>,

    /// Operation used by the read stream.
    #[arg(long, value_enum, default_value_t = ReadOp::Networks)]
    pub read_op: ReadOp,

    /// Prompt on stdin for every rate not given on the command line.
    #[arg(short, long)]
    pub interactive: bool,

    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Print every attempt, not just the summaries.
    #[arg(short, long)]
    pub verbose: bool,

    /// Serve Prometheus metrics on this address.
    #[arg(long)]
    pub prometheus: Option<SocketAddr>,
}

impl Cli {
    /// Resolve the run configuration, prompting through `input`/`output` when interactive.
    pub fn run_config<R, W>(&self, input: &mut R, output: &mut W) -> Result<RunConfig, SetupError>
    where
        R: BufRead,
        W: Write,
    {
        let mut config = RunConfig::new().ticks(self.ticks);
        for (name, rate) in [
            (CREATE_STREAM, self.create_rate),
            (READ_STREAM, self.read_rate),
        ] {
            let rate = match rate {
                Some(rate) => rate,
                None if self.interactive => prompt_rate(name, input, output)?,
                None => 0,
            };
            config = config.stream(name, rate);
        }

        if config.active_streams().next().is_none() {
            warn!("Every stream has a rate of zero; ticks will be empty");
        }
        Ok(config)
    }
}

/// Ask for a non-negative rate until a valid one is entered.
pub fn prompt_rate<R, W>(name: &str, input: &mut R, output: &mut W) -> Result<u32, SetupError>
where
    R: BufRead,
    W: Write,
{
    loop {
        write!(output, "{name} rate (attempts per second): ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(SetupError::MissingRate(name.to_string()));
        }

        match line.trim().parse::<u32>() {
            Ok(rate) => return Ok(rate),
            Err(_) => writeln!(output, "`{}` is not a non-negative integer", line.trim())?,
        }
    }
}

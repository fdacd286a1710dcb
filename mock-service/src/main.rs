use clap::Parser;
use mock_service::{Limits, DEFAULT_PORT};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(version, about = "Rate-limited mock control plane")]
struct Args {
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// list-networks calls allowed per second.
    #[arg(long, default_value = "10")]
    list_networks: NonZeroU32,

    /// list-services calls allowed per second.
    #[arg(long, default_value = "10")]
    list_services: NonZeroU32,

    /// create-network calls allowed per second.
    #[arg(long, default_value = "5")]
    create_network: NonZeroU32,

    /// Artificial processing time per admitted call, in milliseconds.
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter("mock_service=debug,tower_http=info")
        .init();

    let args = Args::parse();
    let limits = Limits {
        list_networks: args.list_networks,
        list_services: args.list_services,
        create_network: args.create_network,
        delay: Duration::from_millis(args.delay_ms),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    mock_service::run(addr, limits).await?;
    Ok(())
}

use clap::Parser;
use llm_proxy_fixtures::{EchoMode, EchoServerConfig, echo, logging};
use tracing::info;

/// WebSocket echo server: every text or binary frame is sent back unchanged.
#[derive(Parser, Debug)]
#[command(name = "ws-echo", version, about)]
struct Args {
    /// Liveness strategy for each connection
    #[arg(long, value_enum, default_value_t = EchoMode::Keepalive)]
    mode: EchoMode,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init();

    let config = EchoServerConfig::for_mode(args.mode);
    let server = echo::start(&config).await?;
    info!("Press Ctrl+C to stop");

    server.run_until_signal().await
}

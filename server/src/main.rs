use clap::Parser;
use log::info;
use server::config::ServerConfig;
use server::network::Server;
use shared::{SERVER_PORT, TARGET_FPS};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = SERVER_PORT)]
    port: u16,

    /// Tick rate (updates per second)
    #[arg(short, long, default_value_t = TARGET_FPS)]
    tick_rate: u32,

    /// Deactivate players silent for this many milliseconds
    #[arg(long)]
    session_timeout_ms: Option<u64>,

    /// Seed for ball serves
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = ServerConfig {
        bind_addr: format!("{}:{}", args.host, args.port),
        tick_rate: args.tick_rate,
        session_timeout: args.session_timeout_ms.map(Duration::from_millis),
        seed: args.seed,
        ..ServerConfig::default()
    };

    info!("Starting pong server at {} Hz", config.tick_rate);
    if let Some(timeout) = config.session_timeout {
        info!("Silent players are dropped after {:?}", timeout);
    }

    let mut server = Server::new(config).await?;
    server.run().await?;

    let summary = server.context_mut().stats_mut().summary();
    info!(
        "Sent {} packets ({} bytes), received {} packets ({} bytes), loss {}%, throughput {:.1} bps over {:?}",
        summary.packets_sent,
        summary.bytes_sent,
        summary.packets_received,
        summary.bytes_received,
        summary.loss_percent,
        summary.throughput_bps,
        summary.elapsed
    );

    Ok(())
}

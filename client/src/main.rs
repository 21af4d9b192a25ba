use clap::Parser;
use client::input::spawn_stdin_input;
use client::network::{Client, ClientConfig};
use client::rendering::LogRenderer;
use log::info;
use shared::{CONNECT_TIMEOUT_MS, TARGET_FPS};
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: SocketAddr,

    /// Player name, truncated to 15 bytes
    #[arg(short, long, default_value = "Player")]
    name: String,

    /// How long to wait for the join reply
    #[arg(long, default_value_t = CONNECT_TIMEOUT_MS)]
    connect_timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let name = match args.name.trim() {
        "" => "Player".to_string(),
        name => name.to_string(),
    };

    let config = ClientConfig {
        server_addr: args.server,
        name,
        connect_timeout: Duration::from_millis(args.connect_timeout_ms),
        tick_rate: TARGET_FPS,
        ..ClientConfig::default()
    };

    let mut client = Client::connect(&config).await?;
    info!("Controls: w + Enter up, s + Enter down, Enter alone to stop, q to quit");

    let mut input = spawn_stdin_input();
    let mut renderer = LogRenderer::new(TARGET_FPS);
    client.run(&mut input, &mut renderer).await?;

    let summary = client.context_mut().stats_mut().summary();
    info!(
        "Sent {} packets, received {}, lost {} ({}%), rtt avg {:.1} ms, throughput {:.1} bps",
        summary.packets_sent,
        summary.packets_received,
        summary.packets_lost,
        summary.loss_percent,
        summary.rtt_avg,
        summary.throughput_bps
    );

    Ok(())
}

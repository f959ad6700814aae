mod network;
mod registry;
mod utils;
mod world;

use clap::Parser;
use log::info;
use network::Server;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Simulation tick rate (updates per second)
    #[arg(short, long, default_value = "20")]
    tick_rate: u32,

    /// State broadcast rate (snapshots per second, at most the tick rate)
    #[arg(short, long, default_value = "10")]
    broadcast_rate: u32,

    /// Maximum number of concurrent sessions
    #[arg(short, long, default_value = "16")]
    max_clients: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let address = format!("{}:{}", args.host, args.port);
    let tick_duration = Duration::from_secs_f32(1.0 / args.tick_rate.max(1) as f32);
    let broadcast_duration = Duration::from_secs_f32(1.0 / args.broadcast_rate.max(1) as f32);

    info!(
        "Starting server on {} ({}Hz simulation, {}Hz broadcast, {} clients max)",
        address, args.tick_rate, args.broadcast_rate, args.max_clients
    );

    let mut server = Server::new(
        &address,
        tick_duration,
        broadcast_duration,
        args.max_clients,
    )
    .await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}

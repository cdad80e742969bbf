use clap::Parser;
use log::{error, info};
use server::config::ServerConfig;
use server::network::Server;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,
    /// Only accept WebSocket handshakes from this Origin
    #[arg(long)]
    allowed_origin: Option<String>,
    /// Milliseconds a connection may take to complete the WebSocket handshake
    #[arg(long, default_value = "10000")]
    handshake_timeout_ms: u64,
    /// Milliseconds between clock ticks
    #[arg(long, default_value = "1000")]
    tick_ms: u64,
    /// Maximum number of concurrent clients
    #[arg(long, default_value = "64")]
    max_clients: usize,
    /// Frames buffered per client before it is dropped
    #[arg(long, default_value = "256")]
    outbound_queue: usize,
    /// Width of the procedural map in hexes
    #[arg(long, default_value = "24")]
    map_width: u32,
    /// Height of the procedural map in hexes
    #[arg(long, default_value = "16")]
    map_height: u32,
    /// Number of procedural countries
    #[arg(long, default_value = "6")]
    countries: usize,
    /// Directory with characters.json, countries.json and tile_states.json
    #[arg(long)]
    seed_dir: Option<PathBuf>,
    /// Seed for the random number generator
    #[arg(long)]
    rng_seed: Option<u64>,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            host: args.host,
            port: args.port,
            allowed_origin: args.allowed_origin,
            handshake_timeout: Duration::from_millis(args.handshake_timeout_ms),
            tick_interval: Duration::from_millis(args.tick_ms.max(1)),
            max_clients: args.max_clients,
            outbound_queue: args.outbound_queue,
            map_width: args.map_width,
            map_height: args.map_height,
            countries: args.countries,
            seed_dir: args.seed_dir,
            rng_seed: args.rng_seed,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let server = Server::bind(args.into()).await?;

    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, shutting down gracefully...");
                shutdown.shutdown();
            }
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    let world = server.run().await;
    info!("Stopped at clock {}", world.clock());
    Ok(())
}

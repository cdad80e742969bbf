use clap::Parser;
use client::network::Client;
use log::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// WebSocket URL of the server
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:3000")]
    server: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    info!("Starting client...");
    let mut client = Client::connect(&args.server).await?;

    loop {
        tokio::select! {
            result = client.process_next() => {
                match result {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => {
                        error!("Connection error: {}", e);
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, disconnecting...");
                client.close().await?;
                break;
            }
        }
    }

    if let Some(reason) = client.close_reason() {
        info!("Closed by server: {}", reason);
    }
    if let Some(mirror) = client.session().mirror() {
        info!(
            "Last clock {}, {} players, {} clock anomalies",
            mirror.clock(),
            mirror.player_count(),
            client.session().clock_anomalies()
        );
    }

    Ok(())
}

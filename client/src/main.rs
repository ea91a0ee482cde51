use clap::Parser;
use client::config::ClientConfig;
use client::network::Client;
use log::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let config = ClientConfig::parse();

    info!("Starting client...");
    info!("Connecting to: {}", config.server);
    if config.fake_ping > 0 {
        info!("Simulating {}ms latency", config.fake_ping);
    }
    info!("Input bot seed: {}", config.seed);

    let mut client = Client::new(config).await?;
    client.run().await?;

    Ok(())
}

use clap::builder::RangedU64ValueParser;
use clap::Parser;
use shared::{DEFAULT_TICK_RATE, MAX_LOBBY_SIZE};
use std::time::Duration;

/// Authoritative arena server
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct ServerConfig {
    /// Address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// UDP port to listen on (0 picks a free port)
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    /// Simulation ticks per second
    #[arg(short, long, default_value_t = DEFAULT_TICK_RATE)]
    pub tick_rate: u32,

    /// Maximum concurrent clients
    #[arg(
        short,
        long,
        default_value_t = 16,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..=MAX_LOBBY_SIZE as u64)
    )]
    pub max_clients: usize,

    /// Seconds of silence before a client is dropped
    #[arg(long, default_value_t = 5)]
    pub client_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            tick_rate: DEFAULT_TICK_RATE,
            max_clients: 16,
            client_timeout_secs: 5,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / self.tick_rate.max(1) as u64)
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.client_timeout_secs)
    }
}

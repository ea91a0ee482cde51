use clap::Parser;

/// Arena client driven by a scripted input bot
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct ClientConfig {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    pub server: String,

    /// Simulate network latency in milliseconds
    #[arg(short = 'l', long, default_value_t = 0)]
    pub fake_ping: u64,

    /// Seed for the input bot
    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Degrees of rotation per unit of look input
    #[arg(long, default_value_t = 1.0)]
    pub look_sensitivity: f32,

    /// Log the HUD every this many ticks (0 disables it)
    #[arg(long, default_value_t = 50)]
    pub hud_interval: u32,

    /// Stop after this many ticks
    #[arg(long)]
    pub max_ticks: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: "127.0.0.1:8080".to_string(),
            fake_ping: 0,
            seed: 1,
            look_sensitivity: 1.0,
            hud_interval: 50,
            max_ticks: None,
        }
    }
}

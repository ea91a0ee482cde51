//! # Arena Server Library
//!
//! The authoritative half of the arena. The server is the only peer that
//! validates attack requests, advances attack lifecycles, detects hits and
//! applies damage. Clients learn about every outcome through replication
//! events and periodic snapshots.
//!
//! ## Tick pipeline
//!
//! Every fixed tick the server:
//! 1. applies queued movement inputs from all clients in timestamp order
//! 2. advances each player's attack state machine and timers
//! 3. separates overlapping bodies and resolves hitbox overlaps into damage
//! 4. sends the resulting events (broadcast or to the owning client)
//! 5. broadcasts a snapshot with the last processed input per client
//!
//! The simulation step is the configured tick duration, not wall-clock time,
//! so server and client predictions advance by identical amounts.
//!
//! ## Modules
//!
//! - `client_manager`: connections, input queues, command sequencing, timeouts
//! - `config`: command-line options
//! - `game`: authoritative world state
//! - `network`: UDP tasks and the main loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig {
//!         port: 8080,
//!         tick_rate: 50,
//!         ..ServerConfig::default()
//!     };
//!
//!     let mut server = Server::new(&config).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod game;
pub mod network;

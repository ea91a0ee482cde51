//! # Arena Client Library
//!
//! Client side of the arena: it predicts the local player's movement and
//! attack timers, forwards attack requests to the server, and mirrors
//! everything the server decides.
//!
//! ## Prediction and reconciliation
//!
//! Movement inputs are applied locally the moment they are sampled and kept
//! in an input history. Each server snapshot acknowledges the inputs it has
//! processed; the client replays the rest on top of the authoritative motion
//! and only snaps to the result when it drifted past
//! [`game::RECONCILE_THRESHOLD`].
//!
//! Combat is never predicted. An attack press becomes a sequenced command to
//! the server; the hitbox, victims and health change only when the server's
//! replication events arrive. The one exception is the attack cooldown, which
//! the local player counts down between snapshots so the HUD stays smooth.
//!
//! ## Modules
//!
//! - `config`: command-line options
//! - `game`: predicted local player, remote replicas, reconciliation
//! - `input`: input sampling, sequencing and the scripted bot
//! - `network`: UDP loop tying the above together
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::config::ClientConfig;
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig {
//!         server: "127.0.0.1:8080".to_string(),
//!         max_ticks: Some(500),
//!         ..ClientConfig::default()
//!     };
//!
//!     let mut client = Client::new(config).await?;
//!     client.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod game;
pub mod input;
pub mod network;

//! # Tower Defense Server Library
//!
//! This library provides the authoritative server for a cooperative
//! multiplayer tower-defense game. Several players share one procedurally
//! generated map, build towers with their own money, and defend against
//! waves of enemies walking a single road. The server owns the canonical
//! state and publishes snapshots to every connected client.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Every rule runs here: placement validation, economy, enemy movement,
//! tower targeting, damage and resistances, wave scheduling and game over.
//! Clients only send intentions and render the snapshots they receive.
//!
//! ### Client Management
//! Handles the lifecycle of client connections:
//! - Connection establishment and player assignment
//! - Command routing with a synchronous result per command
//! - Disconnection and timeout handling, releasing the player's towers
//!
//! ### State Broadcasting
//! A full snapshot goes out after each accepted mutating command and on
//! every tick while the game is running.
//!
//! ## Architecture Design
//!
//! ### Single Logical Timeline
//! Commands and ticks are handled in one `tokio::select!` loop that owns the
//! [`game::GameState`], so no tick ever observes a half-applied command.
//! Network IO and timeout detection live in helper tasks that talk to the
//! loop over channels.
//!
//! ### Deterministic Engine
//! The engine keeps its own clock (the sum of tick deltas) and takes an
//! explicit seed for map generation, so whole games can be replayed in tests.
//!
//! ## Module Organization
//!
//! - `map`: terrain grid and road generation
//! - `tower`, `enemy`, `player`: entity models and their rules
//! - `wave`: wave composition and spawn schedule
//! - `game`: the simulation engine and command API
//! - `error`: reasons a command is rejected
//! - `config`: tunables for the engine and the gateway
//! - `client_manager`, `network`: the UDP session gateway
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::{GameConfig, ServerConfig};
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 10Hz ticks, default economy, random map
//!     let mut server = Server::new(
//!         "127.0.0.1:8080",
//!         ServerConfig::from_tick_rate(10),
//!         GameConfig::default(),
//!     )
//!     .await?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod enemy;
pub mod error;
pub mod game;
pub mod map;
pub mod network;
pub mod player;
pub mod tower;
pub mod wave;

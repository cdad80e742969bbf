//! # Hex Realm Server Library
//!
//! This library provides the authoritative server for the hex-grid world. It
//! owns the canonical world state, accepts WebSocket connections, and keeps
//! every connected client's mirror current through a small message catalogue.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative State
//! The server holds the only writable copy of the world: tiles, countries,
//! characters, players and the clock. Clients never mutate it directly.
//!
//! ### Client Management
//! Handles the lifecycle of client connections:
//! - Connection establishment, player creation and country assignment
//! - Bounded per-client outbound queues
//! - Disconnection handling, including release of the player's country
//!
//! ### State Broadcasting
//! A new client receives one full snapshot followed by its identity. After
//! that, joins, departures, country switches and clock ticks are pushed as
//! small delta messages.
//!
//! ## Architecture Design
//!
//! ### Single-Writer Event Loop
//! All mutations run on one task that processes a single event to completion
//! before the next. Connection tasks and the tick task only post events to
//! it, so the Player/Country link is never observed half updated.
//!
//! ### Non-Blocking Fan-Out
//! Each connection has its own writer task fed by a bounded queue. The event
//! loop never awaits a socket; a client whose queue is full is disconnected
//! instead of stalling everyone else.
//!
//! ## Module Organization
//!
//! ### World Module (`world`)
//! The entity store and the country assignment rules.
//!
//! ### Seed Module (`seed`)
//! Loading seed files and procedural world generation.
//!
//! ### Client Manager Module (`client_manager`)
//! Registry of live connections and their outbound queues.
//!
//! ### Tick Module (`tick`)
//! The fixed-rate clock task.
//!
//! ### Network Module (`network`)
//! Accept loop, per-connection tasks and the event loop itself.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind(ServerConfig::default()).await?;
//!     let shutdown = server.shutdown_handle();
//!
//!     tokio::spawn(async move {
//!         let _ = tokio::signal::ctrl_c().await;
//!         shutdown.shutdown();
//!     });
//!
//!     server.run().await;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod network;
pub mod seed;
pub mod tick;
pub mod world;

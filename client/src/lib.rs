//! # Hex Realm Client Library
//!
//! This library provides the client side of the hex-grid world: a local mirror
//! of the authoritative state, the protocol state machine that keeps it
//! current, and the viewport and editing tools a front end builds on.
//!
//! ## Architecture Overview
//!
//! The client never predicts. It receives one full snapshot, builds its mirror
//! from it, then applies every later message in the order it arrives.
//!
//! ### Two-Phase Construction
//! Entities reference each other by id. The mirror creates every entity first
//! and resolves references afterwards, so a reference that names something
//! missing from the snapshot degrades to `None` instead of failing the whole
//! snapshot.
//!
//! ### Synchronization
//! A session starts `Connecting`, becomes `Synced` once a snapshot has been
//! applied and ends `Disconnected`. Deltas that arrive before the snapshot are
//! dropped; the snapshot already contains their effect.
//!
//! ## Module Organization
//!
//! ### Mirror Module (`mirror`)
//! The replicated entities and the handlers for each delta message.
//!
//! ### Session Module (`session`)
//! The sync state machine, frame decoding and anomaly accounting.
//!
//! ### Network Module (`network`)
//! WebSocket transport feeding frames into a session.
//!
//! ### Painter Module (`painter`)
//! Brush and paint bucket tools over the mirror's terrain, plus export in the
//! seed-file format.
//!
//! ### Camera Module (`camera`)
//! Canvas and world space conversion, zoom and panning.
//!
//! ### Selection Module (`selection`)
//! The hex the user last clicked, resolved against the mirror.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//! use client::session::SyncState;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::connect("ws://127.0.0.1:3000").await?;
//!
//!     client
//!         .process_until(Duration::from_secs(5), |session| {
//!             session.state() == SyncState::Synced
//!         })
//!         .await?;
//!
//!     if let Some(mirror) = client.session().mirror() {
//!         println!("clock is {}", mirror.clock());
//!     }
//!     Ok(())
//! }
//! ```

pub mod camera;
pub mod mirror;
pub mod network;
pub mod painter;
pub mod selection;
pub mod session;

//! Connection registry for the WebSocket server
//!
//! This module tracks every live connection and owns the sending half of its
//! outbound queue:
//! - Connection lifecycle (register, unregister) and capacity enforcement
//! - Session id assignment, which doubles as the player id
//! - Non-blocking delivery of encoded frames to one client or to everyone
//!
//! Delivery never waits on a slow peer. Each client has a bounded queue
//! drained by its own writer task; a frame that does not fit marks the client
//! as lagging and the caller disconnects it.

use log::{debug, info, warn};
use shared::PlayerId;
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::sync::mpsc::{self, error::TrySendError};

/// A registered connection
///
/// Holds the peer address for logging and the sender feeding the
/// connection's writer task. Dropping the sender closes the socket once
/// the writer has flushed what is already queued.
#[derive(Debug)]
pub struct Client {
    /// Session id assigned by the server
    pub id: PlayerId,
    /// Remote address of the WebSocket peer
    pub addr: SocketAddr,
    /// Bounded queue of encoded text frames
    outbound: mpsc::Sender<String>,
}

impl Client {
    /// Creates a client record around an already spawned writer queue
    pub fn new(id: PlayerId, addr: SocketAddr, outbound: mpsc::Sender<String>) -> Self {
        Self { id, addr, outbound }
    }

    /// Queues one frame without waiting
    ///
    /// Returns false when the queue is full or the writer has gone away.
    /// Either way the client can no longer be kept in sync.
    pub fn try_send(&self, frame: String) -> bool {
        match self.outbound.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Outbound queue for {} is full", self.id);
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Outbound queue for {} is closed", self.id);
                false
            }
        }
    }
}

/// Manages all connected clients
///
/// The ClientManager is owned by the server's event loop and is never shared
/// between tasks, so registration order and delivery order are exactly the
/// order in which the loop processes events.
pub struct ClientManager {
    /// Connected clients indexed by session id
    clients: HashMap<PlayerId, Client>,
    /// Counter used to mint the next session id
    next_client_id: u64,
    /// Maximum number of concurrent clients allowed
    max_clients: usize,
}

impl ClientManager {
    /// Creates an empty registry with the given capacity
    ///
    /// Session ids are `player-1`, `player-2` and so on, never reused within
    /// one server run.
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Returns true if another connection would exceed capacity
    pub fn is_full(&self) -> bool {
        self.clients.len() >= self.max_clients
    }

    /// Registers a new connection
    ///
    /// Returns the assigned session id, or None if the server is at capacity.
    pub fn add_client(
        &mut self,
        addr: SocketAddr,
        outbound: mpsc::Sender<String>,
    ) -> Option<PlayerId> {
        if self.is_full() {
            return None;
        }

        let client_id = format!("player-{}", self.next_client_id);
        self.next_client_id += 1;

        info!("Client {} connected from {}", client_id, addr);
        self.clients
            .insert(client_id.clone(), Client::new(client_id.clone(), addr, outbound));

        Some(client_id)
    }

    /// Unregisters a connection
    ///
    /// Returns true if the client was present. Dropping its sender lets the
    /// writer task finish and close the socket.
    pub fn remove_client(&mut self, client_id: &str) -> bool {
        if let Some(client) = self.clients.remove(client_id) {
            info!("Client {} ({}) disconnected", client.id, client.addr);
            true
        } else {
            false
        }
    }

    /// Sends one frame to a single client
    ///
    /// Returns false if the client is unknown or lagging.
    pub fn send_to(&self, client_id: &str, frame: String) -> bool {
        match self.clients.get(client_id) {
            Some(client) => client.try_send(frame),
            None => false,
        }
    }

    /// Sends one frame to every client except `exclude`
    ///
    /// Returns the ids of clients whose queue rejected the frame. They are
    /// still registered; the caller decides how to drop them.
    pub fn broadcast(&self, frame: &str, exclude: Option<&str>) -> Vec<PlayerId> {
        self.clients
            .values()
            .filter(|client| Some(client.id.as_str()) != exclude)
            .filter(|client| !client.try_send(frame.to_string()))
            .map(|client| client.id.clone())
            .collect()
    }

    /// Looks up a client by session id
    pub fn get(&self, client_id: &str) -> Option<&Client> {
        self.clients.get(client_id)
    }

    /// Returns the number of currently connected clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns true if no clients are currently connected
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

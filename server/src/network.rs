//! Server network layer: WebSocket connections and the world event loop

use crate::client_manager::ClientManager;
use crate::config::ServerConfig;
use crate::seed::SeedData;
use crate::tick::spawn_tick_loop;
use crate::world::{CountryReassignment, WorldState};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, trace, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{Packet, PlayerId, PlayerSwitchedCountriesPayload};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

pub const SERVER_FULL_REASON: &str = "Server full";

/// Per-connection settings handed from the accept loop to each connection task
#[derive(Debug, Clone)]
struct ConnectionSettings {
    allowed_origin: Option<String>,
    outbound_queue: usize,
    handshake_timeout: Duration,
}

impl ConnectionSettings {
    fn from_config(config: &ServerConfig) -> Self {
        Self {
            allowed_origin: config.allowed_origin.clone(),
            outbound_queue: config.outbound_queue.max(1),
            handshake_timeout: config.handshake_timeout,
        }
    }
}

/// Events posted to the event loop by connection tasks and the tick task
#[derive(Debug)]
pub enum ServerMessage {
    Connected {
        addr: SocketAddr,
        outbound: mpsc::Sender<String>,
        reply: oneshot::Sender<Option<PlayerId>>,
    },
    Disconnected {
        client_id: PlayerId,
    },
    Tick,
}

/// Stops a running [`Server`]. Cloneable so both the binary's signal handler
/// and tests can hold one.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }
}

/// The authoritative server. [`Server::run`] owns the world and the client
/// registry on a single task; every mutation happens there, one event at a
/// time.
pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
    world: WorldState,
    clients: ClientManager,
    rng: StdRng,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl Server {
    /// Builds the world from the configured seed source and binds the listener.
    pub async fn bind(config: ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let mut rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let seed = match &config.seed_dir {
            Some(dir) => SeedData::load(dir)?,
            None => SeedData::procedural(
                config.map_width,
                config.map_height,
                config.countries,
                &mut rng,
            ),
        };
        Self::bind_with_world(config, seed.into_world(), rng).await
    }

    /// Binds the listener around an already built world.
    pub async fn bind_with_world(
        config: ServerConfig,
        world: WorldState,
        rng: StdRng,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(config.bind_address()).await?;
        info!("Server listening on {}", listener.local_addr()?);

        for violation in world.link_violations() {
            warn!("Initial world: {}", violation);
        }

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Server {
            listener,
            clients: ClientManager::new(config.max_clients),
            config,
            world,
            rng,
            server_tx,
            server_rx,
            shutdown_tx: Arc::new(shutdown_tx),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: Arc::clone(&self.shutdown_tx),
        }
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    /// Runs until the shutdown handle fires. Returns the final world.
    pub async fn run(mut self) -> WorldState {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let tick_handle = spawn_tick_loop(
            self.config.tick_interval,
            self.server_tx.clone(),
            self.shutdown_tx.subscribe(),
            || ServerMessage::Tick,
        );
        let accept_handle = tokio::spawn(accept_loop(
            self.listener,
            self.server_tx.clone(),
            self.shutdown_tx.subscribe(),
            ConnectionSettings::from_config(&self.config),
        ));

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::Connected { addr, outbound, reply }) => {
                            match self.clients.add_client(addr, outbound) {
                                Some(client_id) => {
                                    // connection task stopped waiting; it will report a disconnect
                                    let _ = reply.send(Some(client_id.clone()));
                                    handle_join(&mut self.world, &mut self.clients, &mut self.rng, &client_id);
                                }
                                None => {
                                    warn!("Rejecting {}: server full", addr);
                                    let _ = reply.send(None);
                                }
                            }
                        }
                        Some(ServerMessage::Disconnected { client_id }) => {
                            handle_leave(&mut self.world, &mut self.clients, &client_id);
                        }
                        Some(ServerMessage::Tick) => {
                            handle_tick(&mut self.world, &mut self.clients);
                        }
                        None => break,
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Server shutting down");
                        break;
                    }
                }
            }
        }

        self.shutdown_tx.send_replace(true);
        if let Err(e) = tick_handle.await {
            error!("Tick task failed: {}", e);
        }
        if let Err(e) = accept_handle.await {
            error!("Accept task failed: {}", e);
        }

        self.world
    }
}

/// Sends `packet` to one client. A client that cannot take it is dropped.
fn send_packet(
    world: &mut WorldState,
    clients: &mut ClientManager,
    client_id: &str,
    packet: &Packet,
) {
    let frame = match packet.encode() {
        Ok(frame) => frame,
        Err(e) => {
            error!("Failed to encode {}: {}", packet.name(), e);
            return;
        }
    };
    if !clients.send_to(client_id, frame) {
        handle_leave(world, clients, client_id);
    }
}

/// Sends `packet` to every client except `exclude`, then drops anyone whose
/// queue rejected it. Dropping a client broadcasts in turn, so this recurses
/// until no queue is lagging.
fn broadcast_packet(
    world: &mut WorldState,
    clients: &mut ClientManager,
    packet: &Packet,
    exclude: Option<&str>,
) {
    let frame = match packet.encode() {
        Ok(frame) => frame,
        Err(e) => {
            error!("Failed to encode {}: {}", packet.name(), e);
            return;
        }
    };
    let lagging = clients.broadcast(&frame, exclude);
    for client_id in lagging {
        warn!("Dropping lagging client {}", client_id);
        handle_leave(world, clients, &client_id);
    }
}

fn switched_countries(reassignment: &CountryReassignment) -> Packet {
    Packet::PlayerSwitchedCountries(PlayerSwitchedCountriesPayload {
        player_id: reassignment.player_id.clone(),
        old_country_id: reassignment.old_country.clone(),
        new_country_id: reassignment.new_country.clone(),
    })
}

fn announce_reassignment(
    world: &mut WorldState,
    clients: &mut ClientManager,
    reassignment: &CountryReassignment,
) {
    if let (Some(displaced), Some(country)) = (
        reassignment.displaced_player.as_ref(),
        reassignment.new_country.as_ref(),
    ) {
        let vacated = Packet::PlayerSwitchedCountries(PlayerSwitchedCountriesPayload {
            player_id: displaced.clone(),
            old_country_id: Some(country.clone()),
            new_country_id: None,
        });
        broadcast_packet(world, clients, &vacated, None);
    }
    if reassignment.is_change() {
        broadcast_packet(world, clients, &switched_countries(reassignment), None);
    }
}

/// Snapshot and identity to the new client, `player_joined` to everyone else,
/// then the country assignment to all.
fn handle_join(
    world: &mut WorldState,
    clients: &mut ClientManager,
    rng: &mut StdRng,
    client_id: &str,
) {
    let name = format!("Player {}", client_id.trim_start_matches("player-"));
    let player = world.add_player(client_id, &name).to_data();

    let snapshot = Packet::FullGameState(world.to_game_data());
    send_packet(world, clients, client_id, &snapshot);
    send_packet(world, clients, client_id, &Packet::YouAre(player.clone()));

    // a queue too small for the snapshot has already been dropped
    if clients.get(client_id).is_none() {
        return;
    }
    broadcast_packet(world, clients, &Packet::PlayerJoined(player), Some(client_id));

    match world.assign_available_country(client_id, rng) {
        Some(reassignment) => announce_reassignment(world, clients, &reassignment),
        None => info!("No country available, {} is spectating", client_id),
    }
}

/// Releases the player's country, removes the player, then announces the
/// departure. Safe to call more than once for the same id.
fn handle_leave(world: &mut WorldState, clients: &mut ClientManager, client_id: &str) {
    if !clients.remove_client(client_id) {
        return;
    }

    if let Some(reassignment) = world.assign_country_to_player(client_id, None) {
        if reassignment.is_change() {
            broadcast_packet(world, clients, &switched_countries(&reassignment), None);
        }
    }
    world.remove_player(client_id);
    broadcast_packet(world, clients, &Packet::PlayerLeft(client_id.to_string()), None);
}

fn handle_tick(world: &mut WorldState, clients: &mut ClientManager) {
    let clock = world.tick();
    trace!("Tick {} to {} clients", clock, clients.len());
    broadcast_packet(world, clients, &Packet::tick(clock), None);
}

async fn accept_loop(
    listener: TcpListener,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    mut shutdown: watch::Receiver<bool>,
    settings: ConnectionSettings,
) {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, addr)) => {
                        tokio::spawn(handle_connection(
                            stream,
                            addr,
                            server_tx.clone(),
                            settings.clone(),
                        ));
                    }
                    Err(e) => error!("Error accepting connection: {}", e),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    debug!("Accept loop stopped");
}

fn check_origin(
    allowed_origin: Option<&str>,
    request: &Request,
    response: Response,
) -> Result<Response, ErrorResponse> {
    let Some(allowed) = allowed_origin else {
        return Ok(response);
    };
    let origin = request
        .headers()
        .get("origin")
        .and_then(|value| value.to_str().ok());
    if origin == Some(allowed) {
        Ok(response)
    } else {
        warn!("Refusing handshake from origin {:?}", origin);
        let mut refusal = ErrorResponse::new(Some("Origin not allowed".to_string()));
        *refusal.status_mut() = StatusCode::FORBIDDEN;
        Err(refusal)
    }
}

/// Owns one WebSocket: registers it with the event loop, pumps its outbound
/// queue into the socket and reports the disconnect when either side ends.
/// Peers that do not finish the handshake within the timeout are dropped
/// before they are registered.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    settings: ConnectionSettings,
) {
    let callback = |request: &Request, response: Response| {
        check_origin(settings.allowed_origin.as_deref(), request, response)
    };
    let handshake = tokio_tungstenite::accept_hdr_async(stream, callback);
    let ws_stream = match timeout(settings.handshake_timeout, handshake).await {
        Ok(Ok(ws_stream)) => ws_stream,
        Ok(Err(e)) => {
            debug!("Handshake with {} failed: {}", addr, e);
            return;
        }
        Err(_) => {
            debug!("Handshake with {} timed out", addr);
            return;
        }
    };
    let (mut ws_sink, mut ws_source) = ws_stream.split();

    let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(settings.outbound_queue);
    let (reply_tx, reply_rx) = oneshot::channel();
    if server_tx
        .send(ServerMessage::Connected {
            addr,
            outbound: outbound_tx,
            reply: reply_tx,
        })
        .is_err()
    {
        return;
    }

    let client_id = match reply_rx.await {
        Ok(Some(client_id)) => client_id,
        _ => {
            let close = CloseFrame {
                code: CloseCode::Again,
                reason: SERVER_FULL_REASON.into(),
            };
            if let Err(e) = ws_sink.send(Message::Close(Some(close))).await {
                debug!("Failed to close {}: {}", addr, e);
            }
            return;
        }
    };

    let mut writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if let Err(e) = ws_sink.send(Message::Text(frame)).await {
                debug!("Write to {} failed: {}", addr, e);
                break;
            }
        }
        let _ = ws_sink.close().await;
    });

    loop {
        tokio::select! {
            incoming = ws_source.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        debug!("Ignoring message from {}: {}", client_id, text);
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("Read from {} failed: {}", client_id, e);
                        break;
                    }
                }
            }
            _ = &mut writer => break,
        }
    }

    if server_tx
        .send(ServerMessage::Disconnected { client_id })
        .is_err()
    {
        debug!("Event loop already stopped");
    }
}

//! Protocol state machine feeding server frames into the mirror.

use crate::mirror::WorldMirror;
use log::{debug, error, info, warn};
use shared::{Packet, PlayerData, ProtocolError};

/// Where a connection is in its synchronization lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Waiting for the first full snapshot.
    Connecting,
    Synced,
    /// Terminal.
    Disconnected,
}

/// Per-connection protocol state: the sync state machine, the mirror it
/// guards and the identity the server assigned to this client.
#[derive(Debug)]
pub struct Session {
    state: SyncState,
    mirror: Option<WorldMirror>,
    me: Option<PlayerData>,
    clock_anomalies: u64,
    ignored_deltas: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SyncState::Connecting,
            mirror: None,
            me: None,
            clock_anomalies: 0,
            ignored_deltas: 0,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn mirror(&self) -> Option<&WorldMirror> {
        self.mirror.as_ref()
    }

    /// Identity as announced by `you_are`.
    pub fn me(&self) -> Option<&PlayerData> {
        self.me.as_ref()
    }

    /// This client's country according to the mirror, which tracks later
    /// switches that `you_are` predates.
    pub fn my_country(&self) -> Option<&str> {
        let me = self.me.as_ref()?;
        self.mirror
            .as_ref()?
            .get_player(&me.id)?
            .country
            .as_deref()
    }

    pub fn clock_anomalies(&self) -> u64 {
        self.clock_anomalies
    }

    pub fn ignored_deltas(&self) -> u64 {
        self.ignored_deltas
    }

    /// Decodes and applies one text frame. Unknown message names and
    /// malformed frames are logged and skipped.
    pub fn handle_frame(&mut self, text: &str) -> bool {
        match Packet::decode(text) {
            Ok(packet) => self.handle_packet(packet),
            Err(ProtocolError::UnknownMessage(name)) => {
                warn!("Ignoring unknown message '{}'", name);
                false
            }
            Err(e) => {
                warn!("Ignoring frame: {}", e);
                false
            }
        }
    }

    /// Applies one message. Returns false when it was ignored.
    pub fn handle_packet(&mut self, packet: Packet) -> bool {
        if self.state == SyncState::Disconnected {
            debug!("Ignoring {} after disconnect", packet.name());
            return false;
        }

        match packet {
            Packet::FullGameState(data) => {
                if self.state == SyncState::Synced {
                    info!("Replacing mirror with a new snapshot");
                }
                let mirror = WorldMirror::from_snapshot(data);
                for violation in mirror.link_violations() {
                    error!("Snapshot: {}", violation);
                }
                info!(
                    "Synced at clock {} with {} players",
                    mirror.clock(),
                    mirror.player_count()
                );
                self.mirror = Some(mirror);
                self.state = SyncState::Synced;
                true
            }
            Packet::YouAre(player) => {
                info!("I am {} ({})", player.name, player.id);
                self.me = Some(player);
                true
            }
            delta => {
                let Some(mirror) = self.mirror.as_mut() else {
                    // the snapshot still to come already reflects this
                    debug!("Ignoring {} before snapshot", delta.name());
                    self.ignored_deltas += 1;
                    return false;
                };
                match delta {
                    Packet::Tick(tick) => {
                        if let Some(anomaly) = mirror.apply_tick(tick.curr_clock_time) {
                            error!(
                                "Clock skip: expected {}, got {}",
                                anomaly.expected, anomaly.received
                            );
                            self.clock_anomalies += 1;
                        }
                        true
                    }
                    Packet::PlayerJoined(player) => {
                        info!("{} joined", player.name);
                        mirror.player_joined(player);
                        true
                    }
                    Packet::PlayerLeft(id) => mirror.player_left(&id),
                    Packet::PlayerSwitchedCountries(payload) => {
                        mirror.player_switched_countries(&payload)
                    }
                    Packet::FullGameState(_) | Packet::YouAre(_) => false,
                }
            }
        }
    }

    pub fn disconnect(&mut self) {
        if self.state != SyncState::Disconnected {
            info!("Disconnected");
            self.state = SyncState::Disconnected;
        }
    }
}

//! Client-side replica of the world, kept current by server messages.
//!
//! A mirror is only ever built from a full snapshot. Entities reference each
//! other by id, so construction runs in two passes: every entity is created
//! from its scalar fields first, then each reference is looked up among the
//! entities that now exist. A reference that does not resolve becomes `None`.

use log::{debug, warn};
use shared::{
    Axial, CharacterData, CharacterId, CountryData, CountryId, GameData, PlayerData, PlayerId,
    PlayerSwitchedCountriesPayload, Resources, Terrain, TileData,
};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct MirrorPlayer {
    pub id: PlayerId,
    pub name: String,
    pub country: Option<CountryId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MirrorCharacter {
    pub id: CharacterId,
    pub name: String,
    pub portrait_frames: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MirrorCountry {
    pub id: CountryId,
    pub name: String,
    pub colour: String,
    pub banner: String,
    pub leader: Option<CharacterId>,
    pub controlling_player: Option<PlayerId>,
    pub resources: Resources,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MirrorTile {
    pub coord: Axial,
    pub name: String,
    pub terrain: Terrain,
    pub controller: Option<CountryId>,
    pub population: f64,
    pub industry: f64,
    pub structure: Option<String>,
}

/// A tick whose clock was not exactly one past the previous value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockAnomaly {
    pub expected: u64,
    pub received: u64,
}

/// References captured in the first construction pass, resolved in the second.
struct PendingLinks {
    leaders: Vec<(CountryId, CharacterId)>,
    controllers: Vec<(Axial, CountryId)>,
    player_countries: Vec<(PlayerId, CountryId)>,
}

#[derive(Debug, Clone, Default)]
pub struct WorldMirror {
    clock: u64,
    is_initialised: bool,
    players: HashMap<PlayerId, MirrorPlayer>,
    characters: HashMap<CharacterId, MirrorCharacter>,
    tiles: HashMap<Axial, MirrorTile>,
    countries: HashMap<CountryId, MirrorCountry>,
}

impl WorldMirror {
    pub fn from_snapshot(data: GameData) -> Self {
        let mut mirror = WorldMirror {
            clock: data.clock,
            is_initialised: data.is_initialised,
            ..Default::default()
        };
        let pending = mirror.instantiate(data);
        mirror.resolve(pending);
        mirror
    }

    fn instantiate(&mut self, data: GameData) -> PendingLinks {
        let mut pending = PendingLinks {
            leaders: Vec::new(),
            controllers: Vec::new(),
            player_countries: Vec::new(),
        };

        for (id, CharacterData { name, portrait_frames, .. }) in data.characters {
            self.characters.insert(
                id.clone(),
                MirrorCharacter {
                    id,
                    name,
                    portrait_frames,
                },
            );
        }

        for (id, country) in data.countries {
            let CountryData {
                name,
                colour,
                banner,
                leader_id,
                resources,
                ..
            } = country;
            if let Some(leader) = leader_id {
                pending.leaders.push((id.clone(), leader));
            }
            self.countries.insert(
                id.clone(),
                MirrorCountry {
                    id,
                    name,
                    colour,
                    banner,
                    leader: None,
                    controlling_player: None,
                    resources,
                },
            );
        }

        for (key, tile) in data.tiles {
            let Some(coord) = Axial::from_key(&key) else {
                warn!("Skipping tile with malformed key '{}'", key);
                continue;
            };
            let TileData {
                name,
                terrain,
                controller_id,
                population,
                industry,
                structure,
                ..
            } = tile;
            if let Some(controller) = controller_id {
                pending.controllers.push((coord, controller));
            }
            self.tiles.insert(
                coord,
                MirrorTile {
                    coord,
                    name,
                    terrain,
                    controller: None,
                    population,
                    industry,
                    structure,
                },
            );
        }

        for (id, PlayerData { name, country_id, .. }) in data.players {
            if let Some(country) = country_id {
                pending.player_countries.push((id.clone(), country));
            }
            self.players.insert(
                id.clone(),
                MirrorPlayer {
                    id,
                    name,
                    country: None,
                },
            );
        }

        pending
    }

    fn resolve(&mut self, mut pending: PendingLinks) {
        for (country_id, leader) in pending.leaders {
            if !self.characters.contains_key(&leader) {
                warn!("Country {} has unknown leader {}", country_id, leader);
                continue;
            }
            if let Some(country) = self.countries.get_mut(&country_id) {
                country.leader = Some(leader);
            }
        }

        for (coord, controller) in pending.controllers {
            if !self.countries.contains_key(&controller) {
                warn!("Tile {} has unknown controller {}", coord, controller);
                continue;
            }
            if let Some(tile) = self.tiles.get_mut(&coord) {
                tile.controller = Some(controller);
            }
        }

        // the player side is authoritative for the link; sort so a duplicate
        // claim always resolves the same way
        pending.player_countries.sort();
        for (player_id, country_id) in pending.player_countries {
            let Some(country) = self.countries.get_mut(&country_id) else {
                warn!("Player {} controls unknown country {}", player_id, country_id);
                continue;
            };
            if let Some(holder) = &country.controlling_player {
                warn!(
                    "Country {} claimed by both {} and {}",
                    country_id, holder, player_id
                );
                continue;
            }
            country.controlling_player = Some(player_id.clone());
            if let Some(player) = self.players.get_mut(&player_id) {
                player.country = Some(country_id);
            }
        }
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn is_initialised(&self) -> bool {
        self.is_initialised
    }

    /// Applies a tick. The new clock is taken even when it is not one past
    /// the old one; that case is reported back so the caller can log it.
    pub fn apply_tick(&mut self, new_clock: u64) -> Option<ClockAnomaly> {
        let expected = self.clock.wrapping_add(1);
        self.clock = new_clock;
        if new_clock == expected {
            None
        } else {
            Some(ClockAnomaly {
                expected,
                received: new_clock,
            })
        }
    }

    pub fn player_joined(&mut self, data: PlayerData) {
        let PlayerData { id, name, country_id } = data;
        if self.players.contains_key(&id) {
            debug!("Player {} already mirrored, replacing", id);
            self.release(&id);
        }
        self.players.insert(
            id.clone(),
            MirrorPlayer {
                id: id.clone(),
                name,
                country: None,
            },
        );
        if let Some(country) = country_id {
            self.link(&id, Some(&country));
        }
    }

    /// Removes a player and clears the country it held. Returns false for an
    /// unknown id.
    pub fn player_left(&mut self, id: &str) -> bool {
        if !self.players.contains_key(id) {
            warn!("Unknown player {} left", id);
            return false;
        }
        self.release(id);
        self.players.remove(id);
        true
    }

    /// Applies a country switch to both sides of the link. Returns false if
    /// the player is unknown.
    pub fn player_switched_countries(&mut self, payload: &PlayerSwitchedCountriesPayload) -> bool {
        if !self.players.contains_key(&payload.player_id) {
            warn!("Country switch for unknown player {}", payload.player_id);
            return false;
        }

        let current = self
            .players
            .get(&payload.player_id)
            .and_then(|player| player.country.clone());
        if current != payload.old_country_id {
            warn!(
                "Player {} switched from {:?} but mirror had {:?}",
                payload.player_id, payload.old_country_id, current
            );
        }

        self.link(&payload.player_id, payload.new_country_id.as_deref());
        true
    }

    fn release(&mut self, player_id: &str) {
        let Some(country_id) = self
            .players
            .get_mut(player_id)
            .and_then(|player| player.country.take())
        else {
            return;
        };
        if let Some(country) = self.countries.get_mut(&country_id) {
            if country.controlling_player.as_deref() == Some(player_id) {
                country.controlling_player = None;
            }
        }
    }

    /// Points the player at `country_id`, clearing its previous country and
    /// whoever held the new one. An unknown country leaves the player without
    /// one.
    fn link(&mut self, player_id: &str, country_id: Option<&str>) {
        self.release(player_id);

        let Some(country_id) = country_id else {
            return;
        };
        let Some(country) = self.countries.get_mut(country_id) else {
            warn!("Player {} switched to unknown country {}", player_id, country_id);
            return;
        };

        let previous = country.controlling_player.replace(player_id.to_string());
        if let Some(previous) = previous.filter(|previous| previous != player_id) {
            if let Some(player) = self.players.get_mut(&previous) {
                player.country = None;
            }
        }
        if let Some(player) = self.players.get_mut(player_id) {
            player.country = Some(country_id.to_string());
        }
    }

    pub fn get_player(&self, id: &str) -> Option<&MirrorPlayer> {
        self.players.get(id)
    }

    pub fn get_country(&self, id: &str) -> Option<&MirrorCountry> {
        self.countries.get(id)
    }

    pub fn get_character(&self, id: &str) -> Option<&MirrorCharacter> {
        self.characters.get(id)
    }

    pub fn get_tile(&self, coord: Axial) -> Option<&MirrorTile> {
        self.tiles.get(&coord)
    }

    pub fn players(&self) -> impl Iterator<Item = &MirrorPlayer> {
        self.players.values()
    }

    pub fn tiles(&self) -> impl Iterator<Item = &MirrorTile> {
        self.tiles.values()
    }

    pub fn countries(&self) -> impl Iterator<Item = &MirrorCountry> {
        self.countries.values()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Local terrain edit. Returns true if the tile exists and changed.
    pub fn set_terrain(&mut self, coord: Axial, terrain: Terrain) -> bool {
        match self.tiles.get_mut(&coord) {
            Some(tile) if tile.terrain != terrain => {
                tile.terrain = terrain;
                true
            }
            _ => false,
        }
    }

    pub fn link_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for player in self.players.values() {
            if let Some(country_id) = &player.country {
                let held_by = self
                    .countries
                    .get(country_id)
                    .and_then(|country| country.controlling_player.as_deref());
                if held_by != Some(player.id.as_str()) {
                    violations.push(format!(
                        "player {} controls {} but it is held by {:?}",
                        player.id, country_id, held_by
                    ));
                }
            }
        }

        for country in self.countries.values() {
            if let Some(player_id) = &country.controlling_player {
                let controls = self
                    .players
                    .get(player_id)
                    .and_then(|player| player.country.as_deref());
                if controls != Some(country.id.as_str()) {
                    violations.push(format!(
                        "country {} is held by {} who controls {:?}",
                        country.id, player_id, controls
                    ));
                }
            }
            if let Some(leader) = &country.leader {
                if !self.characters.contains_key(leader) {
                    violations.push(format!("country {} has missing leader {}", country.id, leader));
                }
            }
        }

        for tile in self.tiles.values() {
            if let Some(controller) = &tile.controller {
                if !self.countries.contains_key(controller) {
                    violations.push(format!(
                        "tile {} is controlled by missing country {}",
                        tile.coord, controller
                    ));
                }
            }
        }

        violations
    }
}

//! The authoritative world store and its country assignment rules.

use log::{info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use shared::{
    Axial, CharacterData, CharacterId, CountryData, CountryId, GameData, PlayerData, PlayerId,
    Resources, Terrain, TileData,
};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    controlled_country: Option<CountryId>,
}

impl Player {
    pub fn controlled_country(&self) -> Option<&str> {
        self.controlled_country.as_deref()
    }

    pub fn to_data(&self) -> PlayerData {
        PlayerData {
            id: self.id.clone(),
            name: self.name.clone(),
            country_id: self.controlled_country.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub portrait_frames: Vec<String>,
}

impl Character {
    pub fn to_data(&self) -> CharacterData {
        CharacterData {
            id: self.id.clone(),
            name: self.name.clone(),
            portrait_frames: self.portrait_frames.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Country {
    pub id: CountryId,
    pub name: String,
    pub colour: String,
    pub banner: String,
    pub leader: Option<CharacterId>,
    pub resources: Resources,
    controlling_player: Option<PlayerId>,
}

impl Country {
    pub fn controlling_player(&self) -> Option<&str> {
        self.controlling_player.as_deref()
    }

    pub fn to_data(&self) -> CountryData {
        CountryData {
            id: self.id.clone(),
            name: self.name.clone(),
            colour: self.colour.clone(),
            banner: self.banner.clone(),
            leader_id: self.leader.clone(),
            controlling_player_id: self.controlling_player.clone(),
            resources: self.resources,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tile {
    pub coord: Axial,
    pub name: String,
    pub terrain: Terrain,
    pub population: f64,
    pub industry: f64,
    pub structure: Option<String>,
    controller: Option<CountryId>,
}

impl Tile {
    pub fn controller(&self) -> Option<&str> {
        self.controller.as_deref()
    }

    pub fn to_data(&self) -> TileData {
        TileData {
            id: self.coord.key(),
            name: self.name.clone(),
            terrain: self.terrain,
            controller_id: self.controller.clone(),
            population: self.population,
            industry: self.industry,
            structure: self.structure.clone(),
        }
    }
}

/// Input for [`WorldState::add_country`].
#[derive(Debug, Clone)]
pub struct NewCountry {
    pub id: CountryId,
    pub name: String,
    pub colour: String,
    pub banner: Option<String>,
    pub leader: Option<CharacterId>,
}

/// Input for [`WorldState::add_tile`].
#[derive(Debug, Clone)]
pub struct NewTile {
    pub coord: Axial,
    pub name: String,
    pub terrain: Terrain,
    pub controller: Option<CountryId>,
    pub population: f64,
    pub industry: f64,
}

/// Outcome of a country reassignment, enough to emit
/// `player_switched_countries` for everyone whose link changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryReassignment {
    pub player_id: PlayerId,
    pub old_country: Option<CountryId>,
    pub new_country: Option<CountryId>,
    /// Player who held `new_country` before and has been left without one.
    pub displaced_player: Option<PlayerId>,
}

impl CountryReassignment {
    pub fn is_change(&self) -> bool {
        self.old_country != self.new_country
    }
}

/// The authoritative world. Players and countries reference each other by id
/// and the link is only ever changed through
/// [`WorldState::assign_country_to_player`], which updates both sides.
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    clock: u64,
    is_initialised: bool,
    players: HashMap<PlayerId, Player>,
    characters: HashMap<CharacterId, Character>,
    tiles: HashMap<Axial, Tile>,
    countries: HashMap<CountryId, Country>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn is_initialised(&self) -> bool {
        self.is_initialised
    }

    pub fn mark_initialised(&mut self) {
        self.is_initialised = true;
    }

    /// Advances the clock by exactly one and returns the new value.
    pub fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    pub fn add_character(&mut self, id: &str, name: &str, portrait_frames: Vec<String>) {
        if self.characters.contains_key(id) {
            warn!("Character {} is already loaded. Skipping.", id);
            return;
        }
        self.characters.insert(
            id.to_string(),
            Character {
                id: id.to_string(),
                name: name.to_string(),
                portrait_frames,
            },
        );
    }

    /// Adds a country. A leader id that names no loaded character is dropped.
    pub fn add_country(&mut self, country: NewCountry) {
        if self.countries.contains_key(&country.id) {
            warn!("Country {} is already loaded. Skipping.", country.id);
            return;
        }

        let leader = country.leader.filter(|id| {
            let known = self.characters.contains_key(id);
            if !known {
                warn!("Country {} names unknown leader {}", country.id, id);
            }
            known
        });

        self.countries.insert(
            country.id.clone(),
            Country {
                id: country.id,
                name: country.name,
                colour: country.colour,
                banner: country.banner.unwrap_or_else(|| "default".to_string()),
                leader,
                resources: Resources::default(),
                controlling_player: None,
            },
        );
    }

    /// Adds a tile. A controller id that names no loaded country is dropped.
    pub fn add_tile(&mut self, tile: NewTile) {
        if self.tiles.contains_key(&tile.coord) {
            warn!("Tile {} is already loaded. Skipping.", tile.coord);
            return;
        }

        let controller = tile.controller.filter(|id| {
            let known = self.countries.contains_key(id);
            if !known {
                warn!("Tile {} names unknown controller {}", tile.coord, id);
            }
            known
        });

        self.tiles.insert(
            tile.coord,
            Tile {
                coord: tile.coord,
                name: tile.name,
                terrain: tile.terrain,
                population: tile.population,
                industry: tile.industry,
                structure: None,
                controller,
            },
        );
    }

    /// Registers a player for a new connection. Returns the existing player if
    /// the id is already present.
    pub fn add_player(&mut self, id: &str, name: &str) -> &Player {
        if self.players.contains_key(id) {
            warn!("Player {} already exists", id);
        }
        let player = self.players.entry(id.to_string()).or_insert_with(|| Player {
            id: id.to_string(),
            name: name.to_string(),
            controlled_country: None,
        });
        info!("Added player {} ({})", player.name, player.id);
        player
    }

    /// Removes a player, releasing its country first. Returns false if the id
    /// was unknown.
    pub fn remove_player(&mut self, id: &str) -> bool {
        if !self.players.contains_key(id) {
            return false;
        }
        self.assign_country_to_player(id, None);
        self.players.remove(id);
        info!("Removed player {}", id);
        true
    }

    /// Points `player_id` at `country_id` (or at nothing), updating both sides
    /// of the link. The player's previous country is released and any other
    /// player holding the target country is vacated.
    ///
    /// Returns `None` when the player is unknown or the country id names no
    /// country; nothing is changed in either case.
    pub fn assign_country_to_player(
        &mut self,
        player_id: &str,
        country_id: Option<&str>,
    ) -> Option<CountryReassignment> {
        if !self.players.contains_key(player_id) {
            return None;
        }
        if let Some(country_id) = country_id {
            if !self.countries.contains_key(country_id) {
                warn!("Cannot assign unknown country {} to {}", country_id, player_id);
                return None;
            }
        }

        let old_country = self
            .players
            .get_mut(player_id)
            .and_then(|player| player.controlled_country.take());
        if let Some(old) = old_country.as_deref() {
            if let Some(country) = self.countries.get_mut(old) {
                country.controlling_player = None;
            }
        }

        let mut displaced_player = None;
        if let Some(new) = country_id {
            if let Some(country) = self.countries.get_mut(new) {
                displaced_player = country
                    .controlling_player
                    .replace(player_id.to_string())
                    .filter(|previous| previous != player_id);
            }
            if let Some(previous) = displaced_player.as_deref() {
                if let Some(player) = self.players.get_mut(previous) {
                    player.controlled_country = None;
                }
            }
            if let Some(player) = self.players.get_mut(player_id) {
                player.controlled_country = Some(new.to_string());
            }
        }

        let reassignment = CountryReassignment {
            player_id: player_id.to_string(),
            old_country,
            new_country: country_id.map(str::to_string),
            displaced_player,
        };
        if reassignment.is_change() {
            info!(
                "Player {} switched from {:?} to {:?}",
                player_id, reassignment.old_country, reassignment.new_country
            );
        }
        Some(reassignment)
    }

    /// A country without a controlling player, chosen uniformly at random.
    pub fn pick_available_country<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<CountryId> {
        let mut available: Vec<&CountryId> = self
            .countries
            .values()
            .filter(|country| country.controlling_player.is_none())
            .map(|country| &country.id)
            .collect();
        // map order is arbitrary; sort so a seeded rng picks reproducibly
        available.sort();
        available.choose(rng).map(|id| (*id).clone())
    }

    /// Gives the player a random free country. `None` means no country was
    /// free and the player stays a spectator.
    pub fn assign_available_country<R: Rng + ?Sized>(
        &mut self,
        player_id: &str,
        rng: &mut R,
    ) -> Option<CountryReassignment> {
        let country = self.pick_available_country(rng)?;
        self.assign_country_to_player(player_id, Some(&country))
    }

    pub fn get_player(&self, id: &str) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn get_country(&self, id: &str) -> Option<&Country> {
        self.countries.get(id)
    }

    pub fn get_character(&self, id: &str) -> Option<&Character> {
        self.characters.get(id)
    }

    pub fn get_tile(&self, coord: Axial) -> Option<&Tile> {
        self.tiles.get(&coord)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn countries(&self) -> impl Iterator<Item = &Country> {
        self.countries.values()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn country_count(&self) -> usize {
        self.countries.len()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Full snapshot for `full_game_state`.
    pub fn to_game_data(&self) -> GameData {
        GameData {
            is_initialised: self.is_initialised,
            clock: self.clock,
            players: self
                .players
                .iter()
                .map(|(id, player)| (id.clone(), player.to_data()))
                .collect(),
            characters: self
                .characters
                .iter()
                .map(|(id, character)| (id.clone(), character.to_data()))
                .collect(),
            tiles: self
                .tiles
                .values()
                .map(|tile| (tile.coord.key(), tile.to_data()))
                .collect(),
            countries: self
                .countries
                .iter()
                .map(|(id, country)| (id.clone(), country.to_data()))
                .collect(),
        }
    }

    /// Every broken cross-entity reference, described. Empty when the world is
    /// consistent.
    pub fn link_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for player in self.players.values() {
            if let Some(country_id) = player.controlled_country.as_deref() {
                match self.countries.get(country_id) {
                    Some(country) if country.controlling_player.as_deref() == Some(&player.id) => {}
                    Some(country) => violations.push(format!(
                        "player {} controls {} but {} is controlled by {:?}",
                        player.id, country_id, country_id, country.controlling_player
                    )),
                    None => violations.push(format!(
                        "player {} controls missing country {}",
                        player.id, country_id
                    )),
                }
            }
        }

        for country in self.countries.values() {
            if let Some(player_id) = country.controlling_player.as_deref() {
                match self.players.get(player_id) {
                    Some(player) if player.controlled_country.as_deref() == Some(&country.id) => {}
                    Some(player) => violations.push(format!(
                        "country {} is controlled by {} but {} controls {:?}",
                        country.id, player_id, player_id, player.controlled_country
                    )),
                    None => violations.push(format!(
                        "country {} is controlled by missing player {}",
                        country.id, player_id
                    )),
                }
            }
            if let Some(leader) = country.leader.as_deref() {
                if !self.characters.contains_key(leader) {
                    violations.push(format!("country {} has missing leader {}", country.id, leader));
                }
            }
        }

        for tile in self.tiles.values() {
            if let Some(controller) = tile.controller.as_deref() {
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

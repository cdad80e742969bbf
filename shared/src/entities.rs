//! Entity payloads as they travel over the wire.
//!
//! These are flat records that reference each other only by id. The server
//! store and the client mirror each keep their own richer representations and
//! convert to and from these at the protocol boundary.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub type PlayerId = String;
pub type CountryId = String;
pub type CharacterId = String;

/// The `"p,q"` string used as the key of the `tiles` map.
pub type TileKey = String;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    #[default]
    Grass,
    Sand,
    ShallowWater,
    DeepWater,
}

impl Terrain {
    pub fn is_water(&self) -> bool {
        matches!(self, Terrain::ShallowWater | Terrain::DeepWater)
    }
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Terrain::Grass => "grass",
            Terrain::Sand => "sand",
            Terrain::ShallowWater => "shallow_water",
            Terrain::DeepWater => "deep_water",
        };
        f.write_str(name)
    }
}

/// Resource balances held by a country.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resources {
    pub money: f64,
    pub wood: f64,
    pub stone: f64,
    pub coal: f64,
    pub livestock: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerData {
    pub id: PlayerId,
    pub name: String,
    pub country_id: Option<CountryId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterData {
    pub id: CharacterId,
    pub name: String,
    #[serde(default)]
    pub portrait_frames: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileData {
    pub id: TileKey,
    #[serde(default)]
    pub name: String,
    pub terrain: Terrain,
    pub controller_id: Option<CountryId>,
    #[serde(default)]
    pub population: f64,
    #[serde(default)]
    pub industry: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryData {
    pub id: CountryId,
    pub name: String,
    pub colour: String,
    pub banner: String,
    pub leader_id: Option<CharacterId>,
    pub controlling_player_id: Option<PlayerId>,
    #[serde(default)]
    pub resources: Resources,
}

/// Complete serialization of the world, the payload of `full_game_state`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameData {
    #[serde(default)]
    pub is_initialised: bool,
    pub clock: u64,
    pub players: HashMap<PlayerId, PlayerData>,
    pub characters: HashMap<CharacterId, CharacterData>,
    pub tiles: HashMap<TileKey, TileData>,
    pub countries: HashMap<CountryId, CountryData>,
}

/// Tile state as stored in seed files, keyed by tile key in the enclosing map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedTileState {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub terrain: Terrain,
    #[serde(default)]
    pub controller: Option<CountryId>,
    #[serde(default)]
    pub population: f64,
    #[serde(default)]
    pub industry: f64,
}

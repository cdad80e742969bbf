//! Seed data for a new world, read from JSON files or generated.

use crate::world::{NewCountry, NewTile, WorldState};
use log::{info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use shared::{rectangle, Axial, CharacterId, CountryId, ExportedTileState, Terrain, TileKey};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CHARACTERS_FILE: &str = "characters.json";
pub const COUNTRIES_FILE: &str = "countries.json";
pub const TILE_STATES_FILE: &str = "tile_states.json";

const COUNTRY_COLOURS: [&str; 8] = [
    "#3b6fd8", "#d83b3b", "#3bab4f", "#8a3bd8", "#e38a27", "#27c4d6", "#d63bb8", "#d6c327",
];

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedCharacter {
    pub name: String,
    #[serde(default)]
    pub portrait_frames: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedCountry {
    pub name: String,
    pub colour: String,
    #[serde(default)]
    pub banner: Option<String>,
    #[serde(default)]
    pub leader: Option<CharacterId>,
}

/// Everything needed to initialise a world, in the shape of the JSON seed files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedData {
    pub characters: BTreeMap<CharacterId, SeedCharacter>,
    pub countries: BTreeMap<CountryId, SeedCountry>,
    pub tile_states: BTreeMap<TileKey, ExportedTileState>,
}

impl SeedData {
    /// Reads `characters.json`, `countries.json` and `tile_states.json` from `dir`.
    pub fn load(dir: &Path) -> Result<Self, SeedError> {
        let seed = Self {
            characters: read_json(&dir.join(CHARACTERS_FILE))?,
            countries: read_json(&dir.join(COUNTRIES_FILE))?,
            tile_states: read_json(&dir.join(TILE_STATES_FILE))?,
        };
        info!(
            "Loaded seed from {}: {} characters, {} countries, {} tiles",
            dir.display(),
            seed.characters.len(),
            seed.countries.len(),
            seed.tile_states.len()
        );
        Ok(seed)
    }

    /// Random terrain over a `width` x `height` hex rectangle, with
    /// `country_count` countries each led by its own character. Land is split
    /// between countries in vertical bands; water stays uncontrolled.
    pub fn procedural<R: Rng + ?Sized>(
        width: u32,
        height: u32,
        country_count: usize,
        rng: &mut R,
    ) -> Self {
        let mut seed = Self::default();

        for index in 0..country_count {
            let character_id = format!("character-{index}");
            let country_id = format!("country-{index}");
            seed.characters.insert(
                character_id.clone(),
                SeedCharacter {
                    name: format!("Leader {}", index + 1),
                    portrait_frames: Vec::new(),
                },
            );
            seed.countries.insert(
                country_id,
                SeedCountry {
                    name: format!("Country {}", index + 1),
                    colour: COUNTRY_COLOURS[index % COUNTRY_COLOURS.len()].to_string(),
                    banner: None,
                    leader: Some(character_id),
                },
            );
        }

        for coord in rectangle(width, height) {
            let terrain = random_terrain(rng);
            let controller = if terrain.is_water() || country_count == 0 {
                None
            } else {
                let band = coord.p as usize * country_count / width.max(1) as usize;
                Some(format!("country-{}", band.min(country_count - 1)))
            };
            let population = if terrain.is_water() {
                0.0
            } else {
                rng.gen_range(0.0..100.0_f64).floor()
            };
            seed.tile_states.insert(
                coord.key(),
                ExportedTileState {
                    name: coord.key(),
                    terrain,
                    controller,
                    population,
                    industry: 0.0,
                },
            );
        }

        info!(
            "Generated {}x{} world with {} countries",
            width, height, country_count
        );
        seed
    }

    /// Builds the world: characters, then countries, then tiles, so every
    /// reference is checked against what is already loaded.
    pub fn into_world(self) -> WorldState {
        let mut world = WorldState::new();

        for (id, character) in self.characters {
            world.add_character(&id, &character.name, character.portrait_frames);
        }

        for (id, country) in self.countries {
            world.add_country(NewCountry {
                id,
                name: country.name,
                colour: country.colour,
                banner: country.banner,
                leader: country.leader,
            });
        }

        for (key, state) in self.tile_states {
            let Some(coord) = Axial::from_key(&key) else {
                warn!("Skipping tile with malformed key '{}'", key);
                continue;
            };
            world.add_tile(NewTile {
                coord,
                name: state.name,
                terrain: state.terrain,
                controller: state.controller,
                population: state.population,
                industry: state.industry,
            });
        }

        world.mark_initialised();
        world
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, SeedError> {
    let text = fs::read_to_string(path).map_err(|source| SeedError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| SeedError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn random_terrain<R: Rng + ?Sized>(rng: &mut R) -> Terrain {
    match rng.gen_range(0..10) {
        0..=5 => Terrain::Grass,
        6 => Terrain::Sand,
        7 | 8 => Terrain::ShallowWater,
        _ => Terrain::DeepWater,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hexrealm-seed-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_procedural_world_is_consistent() {
        let mut rng = StdRng::seed_from_u64(3);
        let world = SeedData::procedural(8, 6, 3, &mut rng).into_world();

        assert!(world.is_initialised());
        assert_eq!(world.clock(), 0);
        assert_eq!(world.tile_count(), 48);
        assert_eq!(world.country_count(), 3);
        assert!(world.link_violations().is_empty());
        for country in world.countries() {
            assert!(country.leader.is_some());
            assert_eq!(country.controlling_player(), None);
        }
    }

    #[test]
    fn test_procedural_is_reproducible() {
        let a = SeedData::procedural(5, 5, 2, &mut StdRng::seed_from_u64(11));
        let b = SeedData::procedural(5, 5, 2, &mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
    }

    #[test]
    fn test_procedural_without_countries() {
        let mut rng = StdRng::seed_from_u64(5);
        let world = SeedData::procedural(3, 3, 0, &mut rng).into_world();
        assert_eq!(world.country_count(), 0);
        assert!(world.link_violations().is_empty());
    }

    #[test]
    fn test_load_from_directory() {
        let dir = temp_dir("load");
        fs::write(
            dir.join(CHARACTERS_FILE),
            r#"{"ch1": {"name": "Queen", "portrait_frames": ["q1.png", "q2.png"]}}"#,
        )
        .unwrap();
        fs::write(
            dir.join(COUNTRIES_FILE),
            r##"{
                "c1": {"name": "Sheapland", "colour": "#ff0000", "banner": null, "leader": "ch1"},
                "c2": {"name": "Nowhere", "colour": "#00ff00", "banner": "flag", "leader": "ghost"}
            }"##,
        )
        .unwrap();
        fs::write(
            dir.join(TILE_STATES_FILE),
            r#"{
                "0,0": {"name": "Capital", "terrain": "grass", "controller": "c1", "population": 10, "industry": 2},
                "1,0": {"name": "", "terrain": "deep_water", "controller": "c9", "population": 0, "industry": 0},
                "bad": {"name": "", "terrain": "sand", "controller": null, "population": 0, "industry": 0}
            }"#,
        )
        .unwrap();

        let seed = SeedData::load(&dir).unwrap();
        assert_eq!(seed.characters["ch1"].portrait_frames.len(), 2);
        let world = seed.into_world();

        assert_eq!(world.get_country("c1").unwrap().leader.as_deref(), Some("ch1"));
        assert_eq!(world.get_country("c2").unwrap().leader, None);
        assert_eq!(world.get_country("c2").unwrap().banner, "flag");
        assert_eq!(
            world.get_tile(Axial::new(0, 0)).unwrap().controller(),
            Some("c1")
        );
        assert_eq!(world.get_tile(Axial::new(1, 0)).unwrap().controller(), None);
        assert_eq!(world.tile_count(), 2);
        assert!(world.link_violations().is_empty());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_missing_file() {
        let dir = temp_dir("missing");
        let err = SeedData::load(&dir).unwrap_err();
        assert!(matches!(err, SeedError::Io { .. }));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = temp_dir("invalid");
        fs::write(dir.join(CHARACTERS_FILE), "{ not json").unwrap();
        let err = SeedData::load(&dir).unwrap_err();
        assert!(matches!(err, SeedError::Parse { .. }));
        fs::remove_dir_all(&dir).ok();
    }
}

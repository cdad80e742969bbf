//! Code shared by the server and the client: hex grid geometry, region
//! traversal, the entity payloads exchanged on the wire and the message
//! catalogue that carries them.

pub mod entities;
pub mod hex;
pub mod protocol;
pub mod region;

pub use entities::{
    CharacterData, CharacterId, CountryData, CountryId, ExportedTileState, GameData, PlayerData,
    PlayerId, Resources, Terrain, TileData, TileKey,
};
pub use hex::{hex_distance, Axial, HexLayout, DEFAULT_SIDE_LENGTH};
pub use protocol::{Packet, PlayerSwitchedCountriesPayload, ProtocolError, TickPayload};
pub use region::{
    bounded_flood_fill, brush_footprint, brush_stroke, neighbors, rectangle,
    DEFAULT_FLOOD_FILL_DEPTH,
};

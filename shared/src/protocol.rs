//! Server to client message catalogue and framing.
//!
//! Every message is one WebSocket text frame holding
//! `{"name": "<message name>", "payload": <json>}`.

use crate::entities::{CountryId, GameData, PlayerData, PlayerId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickPayload {
    pub curr_clock_time: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSwitchedCountriesPayload {
    pub player_id: PlayerId,
    pub old_country_id: Option<CountryId>,
    pub new_country_id: Option<CountryId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "payload", rename_all = "snake_case")]
pub enum Packet {
    /// Identity of the player created for this connection.
    YouAre(PlayerData),
    FullGameState(GameData),
    Tick(TickPayload),
    PlayerJoined(PlayerData),
    PlayerLeft(PlayerId),
    PlayerSwitchedCountries(PlayerSwitchedCountriesPayload),
}

impl Packet {
    pub const NAMES: [&'static str; 6] = [
        "you_are",
        "full_game_state",
        "tick",
        "player_joined",
        "player_left",
        "player_switched_countries",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Packet::YouAre(_) => "you_are",
            Packet::FullGameState(_) => "full_game_state",
            Packet::Tick(_) => "tick",
            Packet::PlayerJoined(_) => "player_joined",
            Packet::PlayerLeft(_) => "player_left",
            Packet::PlayerSwitchedCountries(_) => "player_switched_countries",
        }
    }

    pub fn tick(clock: u64) -> Self {
        Packet::Tick(TickPayload {
            curr_clock_time: clock,
        })
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes one text frame. A well-formed frame whose name is not in the
    /// catalogue yields [`ProtocolError::UnknownMessage`] so callers can skip
    /// it without treating the stream as corrupt.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let frame: RawFrame = serde_json::from_str(text)?;
        if !Self::NAMES.contains(&frame.name.as_str()) {
            return Err(ProtocolError::UnknownMessage(frame.name));
        }
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Deserialize)]
struct RawFrame {
    name: String,
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown message name '{0}'")]
    UnknownMessage(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_tick_frame_layout() {
        let text = Packet::tick(42).encode().unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, json!({ "name": "tick", "payload": { "currClockTime": 42 } }));
    }

    #[test]
    fn test_player_left_payload_is_bare_id() {
        let text = Packet::PlayerLeft("abc".to_string()).encode().unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, json!({ "name": "player_left", "payload": "abc" }));
    }

    #[test]
    fn test_switch_payload_nulls() {
        let packet = Packet::PlayerSwitchedCountries(PlayerSwitchedCountriesPayload {
            player_id: "p1".to_string(),
            old_country_id: None,
            new_country_id: Some("c1".to_string()),
        });
        let value: Value = serde_json::from_str(&packet.encode().unwrap()).unwrap();
        assert_eq!(
            value["payload"],
            json!({ "playerId": "p1", "oldCountryId": null, "newCountryId": "c1" })
        );
    }

    #[test]
    fn test_decode_known_message() {
        let packet = Packet::decode(r#"{"name":"tick","payload":{"currClockTime":7}}"#).unwrap();
        assert_eq!(packet, Packet::tick(7));
    }

    #[test]
    fn test_decode_unknown_message() {
        let err = Packet::decode(r#"{"name":"chat","payload":"hi"}"#).unwrap_err();
        match err {
            ProtocolError::UnknownMessage(name) => assert_eq!(name, "chat"),
            other => panic!("expected unknown message, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(
            Packet::decode("not json"),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            Packet::decode(r#"{"name":"tick","payload":{"wrong":1}}"#),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn test_names_match_variants() {
        let samples = [
            Packet::tick(1),
            Packet::PlayerLeft("x".to_string()),
            Packet::FullGameState(GameData::default()),
        ];
        for packet in samples {
            assert!(Packet::NAMES.contains(&packet.name()));
            let value: Value = serde_json::from_str(&packet.encode().unwrap()).unwrap();
            assert_eq!(value["name"], packet.name());
        }
    }
}

//! Wire protocol.
//!
//! Every message is a JSON envelope `{"type": <tag>, "payload": <body>}`.
//! Payload shapes drifted across server revisions; the types here accept the
//! known variants and expose one normalized view to the rest of the client.
//!
//! The socket itself lives elsewhere: this module only turns text frames
//! into [`NetMsg`] and back.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::math::Vec2;

/// Visual tile type the server uses for water.
pub const VISUAL_WATER: u32 = 0;

/// Server-assigned identifier of a character.
///
/// Older servers sent numeric ids, newer ones strings; both land here as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => PlayerId(s),
            Raw::Number(n) => PlayerId(n.to_string()),
        })
    }
}

/// Message envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum NetMsg {
    // ─── Server -> client ───
    /// Tile map for the session.
    Map(MapPayload),
    /// Batched state of every character the server knows about.
    AllPlayers(Vec<PlayerPayload>),
    /// State of a single character.
    PlayerUpdated(PlayerPayload),
    /// The character this client controls.
    Hero(PlayerPayload),
    /// A character left the game.
    PlayerLeft(PlayerLeft),

    // ─── Client -> server ───
    /// Periodic report of the local character.
    PlayerCoords(PlayerCoords),
    /// Request to join with a display name.
    NewPlayer(NewPlayer),
}

impl NetMsg {
    /// Envelope tag as it appears on the wire.
    pub fn tag(&self) -> &'static str {
        match self {
            NetMsg::Map(_) => "map",
            NetMsg::AllPlayers(_) => "all_players",
            NetMsg::PlayerUpdated(_) => "player_updated",
            NetMsg::Hero(_) => "hero",
            NetMsg::PlayerLeft(_) => "player_left",
            NetMsg::PlayerCoords(_) => "player_coords",
            NetMsg::NewPlayer(_) => "new_player",
        }
    }
}

/// Authoritative character state.
///
/// Everything but `id` is optional on the wire; absent or `null` vectors
/// become [`Vec2::ZERO`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerPayload {
    pub id: PlayerId,
    #[serde(default, deserialize_with = "default_if_null")]
    pub name: String,
    #[serde(default, deserialize_with = "default_if_null")]
    pub position: Vec2,
    #[serde(default, deserialize_with = "default_if_null")]
    pub orientation: Vec2,
    #[serde(default, deserialize_with = "default_if_null")]
    pub velocity: Vec2,
    #[serde(default, deserialize_with = "default_if_null")]
    pub hitting: bool,
}

impl PlayerPayload {
    pub fn at(id: impl Into<String>, position: Vec2) -> Self {
        Self {
            id: PlayerId::new(id),
            name: String::new(),
            position,
            orientation: Vec2::ZERO,
            velocity: Vec2::ZERO,
            hitting: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerLeft {
    pub id: PlayerId,
}

/// Outbound local character report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PlayerCoords {
    pub position: Vec2,
    pub orientation: Vec2,
    pub velocity: Vec2,
    pub hitting: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPlayer {
    pub name: String,
}

/// Map payload: tile entries keyed by `"<x>;<y>"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapPayload {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub content: BTreeMap<String, TileCell>,
}

/// One map cell; servers send either a single entry or a stack of them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TileCell {
    Stack(Vec<TileEntry>),
    Single(TileEntry),
}

impl TileCell {
    pub fn entries(&self) -> &[TileEntry] {
        match self {
            TileCell::Stack(entries) => entries,
            TileCell::Single(entry) => std::slice::from_ref(entry),
        }
    }

    /// A stacked cell is walkable only if every layer is.
    pub fn walkable(&self) -> bool {
        self.entries().iter().all(TileEntry::walkable)
    }
}

/// A tile entry in either known protocol revision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TileEntry {
    Detailed(DetailedTile),
    Legacy(LegacyTile),
}

impl TileEntry {
    pub fn walkable(&self) -> bool {
        match self {
            TileEntry::Detailed(tile) => tile.walkable(),
            TileEntry::Legacy(tile) => tile.walkable,
        }
    }
}

/// Current revision: walkability is derived from what sits on the tile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetailedTile {
    pub x: i32,
    pub y: i32,
    #[serde(rename = "type")]
    pub kind: u32,
    #[serde(default)]
    pub objects: Vec<TileLayer>,
    #[serde(default)]
    pub visuals: Vec<TileLayer>,
}

impl DetailedTile {
    /// No objects on it and no water underneath.
    pub fn walkable(&self) -> bool {
        self.objects.is_empty() && !self.visuals.iter().any(|v| v.kind == VISUAL_WATER)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TileLayer {
    #[serde(rename = "type")]
    pub kind: u32,
    #[serde(default)]
    pub size: f32,
}

/// Early revision: the server states walkability directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LegacyTile {
    #[serde(rename = "type")]
    pub kind: u32,
    #[serde(default)]
    pub index: u32,
    pub walkable: bool,
}

/// Codec failures.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("serialize {tag} message")]
    Encode {
        tag: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("deserialize message")]
    Decode(#[source] serde_json::Error),
}

/// Encodes a message into a text frame.
pub fn encode(msg: &NetMsg) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(|source| ProtocolError::Encode {
        tag: msg.tag(),
        source,
    })
}

/// Decodes a text frame.
pub fn decode(text: &str) -> Result<NetMsg, ProtocolError> {
    serde_json::from_str(text).map_err(ProtocolError::Decode)
}

fn default_if_null<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

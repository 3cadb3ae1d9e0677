//! Walkability map.
//!
//! The client does not render or classify terrain; it only needs to know
//! which integer tiles the local character may step on, and how large the
//! map is. [`WalkabilityMap`] is built once per `map` payload.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{info, warn};

use crate::math::Vec2;
use crate::net::MapPayload;

/// Integer tile coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Tile containing a world position.
    pub fn containing(pos: Vec2) -> Self {
        Self::new(pos.x.floor() as i32, pos.y.floor() as i32)
    }

    /// Parses a `"<x>;<y>"` content key.
    pub fn parse_key(key: &str) -> Result<Self, MapError> {
        let bad = || MapError::BadTileKey(key.to_string());
        let (x, y) = key.split_once(';').ok_or_else(bad)?;
        let x = x.trim().parse().map_err(|_| bad())?;
        let y = y.trim().parse().map_err(|_| bad())?;
        Ok(Self::new(x, y))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum MapError {
    #[error("tile key {0:?} is not of the form \"<x>;<y>\"")]
    BadTileKey(String),
}

/// Lookup from tile coordinate to walkable flag.
///
/// Tiles the server never described are treated as blocked.
#[derive(Debug, Clone, Default)]
pub struct WalkabilityMap {
    width: u32,
    height: u32,
    tiles: HashMap<TileCoord, bool>,
}

impl WalkabilityMap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles: HashMap::new(),
        }
    }

    /// Map where every tile inside the extent is walkable.
    pub fn open(width: u32, height: u32) -> Self {
        let mut map = Self::new(width, height);
        for y in 0..=last_tile(height) {
            for x in 0..=last_tile(width) {
                map.set(TileCoord::new(x, y), true);
            }
        }
        map
    }

    /// Builds the map from a decoded payload. Entries with malformed keys are
    /// skipped.
    pub fn from_payload(payload: &MapPayload) -> Self {
        let mut map = Self::new(payload.width, payload.height);
        let mut skipped = 0usize;
        for (key, cell) in &payload.content {
            match TileCoord::parse_key(key) {
                Ok(coord) => map.set(coord, cell.walkable()),
                Err(e) => {
                    warn!(error = %e, "Skipping map tile");
                    skipped += 1;
                }
            }
        }

        info!(
            width = map.width,
            height = map.height,
            tiles = map.tiles.len(),
            blocked = map.tiles.values().filter(|w| !**w).count(),
            skipped,
            "Walkability map built"
        );
        map
    }

    pub fn set(&mut self, coord: TileCoord, walkable: bool) {
        self.tiles.insert(coord, walkable);
    }

    pub fn is_walkable(&self, coord: TileCoord) -> bool {
        self.tiles.get(&coord).copied().unwrap_or(false)
    }

    /// Whether the tile under a world position is walkable.
    pub fn is_walkable_at(&self, pos: Vec2) -> bool {
        self.is_walkable(TileCoord::containing(pos))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Upper corner of the playable area, in tile units.
    pub fn extent(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Highest tile index along an axis of `extent` tiles, saturating at the
/// coordinate range.
fn last_tile(extent: u32) -> i32 {
    i32::try_from(extent).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{decode, NetMsg};

    #[test]
    fn parses_keys() {
        assert_eq!(TileCoord::parse_key("3;14"), Ok(TileCoord::new(3, 14)));
        assert_eq!(TileCoord::parse_key("-1; 2"), Ok(TileCoord::new(-1, 2)));
        assert!(TileCoord::parse_key("3,14").is_err());
        assert!(TileCoord::parse_key("a;1").is_err());
    }

    #[test]
    fn containing_floors_positions() {
        assert_eq!(TileCoord::containing(Vec2::new(2.99, 0.0)), TileCoord::new(2, 0));
        assert_eq!(TileCoord::containing(Vec2::new(3.0, 7.5)), TileCoord::new(3, 7));
    }

    #[test]
    fn unknown_tiles_are_blocked() {
        let map = WalkabilityMap::new(4, 4);
        assert!(!map.is_walkable(TileCoord::new(0, 0)));
    }

    #[test]
    fn builds_from_payload_and_skips_bad_keys() {
        let text = r#"{"type":"map","payload":{"width":3,"height":3,"content":{
            "0;0": {"x":0,"y":0,"type":1,"objects":[],"visuals":[]},
            "1;0": {"x":1,"y":0,"type":1,"objects":[],"visuals":[{"type":0,"size":1}]},
            "oops": {"x":2,"y":0,"type":1}
        }}}"#;
        let NetMsg::Map(payload) = decode(text).unwrap() else {
            panic!("expected map");
        };
        let map = WalkabilityMap::from_payload(&payload);
        assert_eq!(map.len(), 2);
        assert!(map.is_walkable(TileCoord::new(0, 0)));
        assert!(!map.is_walkable(TileCoord::new(1, 0)));
        assert_eq!(map.extent(), Vec2::new(3.0, 3.0));
    }

    #[test]
    fn open_map_covers_the_far_edge() {
        let map = WalkabilityMap::open(10, 10);
        assert!(map.is_walkable_at(Vec2::new(10.0, 10.0)));
        assert!(!map.is_walkable_at(Vec2::new(11.0, 0.0)));
    }

    #[test]
    fn oversized_extent_saturates_instead_of_wrapping() {
        assert_eq!(last_tile(10), 10);
        assert_eq!(last_tile(u32::MAX), i32::MAX);
        assert_eq!(last_tile(i32::MAX as u32 + 1), i32::MAX);
    }
}

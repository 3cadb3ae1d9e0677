//! Fixtures shared by the integration tests.
//!
//! Payloads are built as wire JSON and decoded through the real codec, so
//! every test also exercises the boundary normalization.

use std::time::Duration;

use zgog_client::{driver::FrameTick, transport::MemoryTransport, SyncDriver};
use zgog_shared::{
    config::ClientConfig,
    math::Vec2,
    net::{decode, NetMsg},
};

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Installs a test-friendly tracing subscriber once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

/// `map` message for a `width` x `height` map, every tile walkable except
/// `blocked`.
pub fn map_msg(width: u32, height: u32, blocked: &[(i32, i32)]) -> NetMsg {
    let mut content = serde_json::Map::new();
    for y in 0..=height as i32 {
        for x in 0..=width as i32 {
            let objects = if blocked.contains(&(x, y)) {
                serde_json::json!([{"type": 1, "size": 1}])
            } else {
                serde_json::json!([])
            };
            content.insert(
                format!("{x};{y}"),
                serde_json::json!({
                    "x": x, "y": y, "type": 2,
                    "objects": objects,
                    "visuals": [{"type": 2, "size": 1}],
                }),
            );
        }
    }
    wire(serde_json::json!({
        "type": "map",
        "payload": {"width": width, "height": height, "content": content},
    }))
}

fn player_json(id: &str, position: Vec2, velocity: Vec2) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": id,
        "position": {"x": position.x, "y": position.y},
        "orientation": {"x": 1.0, "y": 0.0},
        "velocity": {"x": velocity.x, "y": velocity.y},
        "hitting": false,
    })
}

pub fn hero_msg(id: &str, position: Vec2, velocity: Vec2) -> NetMsg {
    wire(serde_json::json!({
        "type": "hero",
        "payload": player_json(id, position, velocity),
    }))
}

/// `all_players` batch with every player standing still.
pub fn batch_msg(players: &[(&str, Vec2)]) -> NetMsg {
    let payload: Vec<_> = players
        .iter()
        .map(|(id, pos)| player_json(id, *pos, Vec2::ZERO))
        .collect();
    wire(serde_json::json!({"type": "all_players", "payload": payload}))
}

fn wire(value: serde_json::Value) -> NetMsg {
    decode(&value.to_string()).expect("fixture must decode")
}

/// Driver connected, with the map loaded and the local player assigned.
pub fn active_driver(
    map: NetMsg,
    local_at: Vec2,
    local_velocity: Vec2,
) -> SyncDriver<MemoryTransport> {
    let mut driver = SyncDriver::new(ClientConfig::default(), MemoryTransport::default());
    driver.on_connected();
    driver.handle_message(map, ms(0));
    driver.handle_message(hero_msg("me", local_at, local_velocity), ms(0));
    driver
}

/// One frame of `elapsed_ms` wall time with an explicit frame delta.
pub fn tick(delta: f32, elapsed_ms: f32, now: Duration) -> FrameTick {
    FrameTick {
        delta,
        elapsed_ms,
        now,
    }
}

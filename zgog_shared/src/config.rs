//! Configuration system.
//!
//! Loads client configuration from JSON strings (file IO left to the app).
//! Every field has a default so partial files are fine.

use serde::{Deserialize, Serialize};

/// Screen size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Root client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// WebSocket endpoint of the game server.
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Name announced with `new_player`.
    #[serde(default = "default_player_name")]
    pub player_name: String,
    /// Pixels per tile.
    #[serde(default = "default_tile_size")]
    pub tile_size: f32,
    /// Top speed of the local character, tiles per frame.
    #[serde(default = "default_character_speed")]
    pub character_speed: f32,
    /// Dead zone around the screen centre, pixels.
    #[serde(default = "default_mouse_leeway")]
    pub mouse_leeway: f32,
    /// Frames between two `player_coords` reports.
    #[serde(default = "default_report_interval_frames")]
    pub report_interval_frames: f32,
    /// Server/local divergence (tiles) above which the local character is
    /// snapped to the server position.
    #[serde(default = "default_reconcile_threshold")]
    pub reconcile_threshold: f32,
    /// Minimum gap between two connection-failure notifications.
    #[serde(default = "default_failure_report_interval_ms")]
    pub failure_report_interval_ms: u64,
    /// Render loop rate.
    #[serde(default = "default_frame_hz")]
    pub frame_hz: u32,
    #[serde(default)]
    pub viewport: Viewport,
}

fn default_server_url() -> String {
    "ws://127.0.0.1:2794/".to_string()
}

fn default_player_name() -> String {
    "Player".to_string()
}

fn default_tile_size() -> f32 {
    64.0
}

fn default_character_speed() -> f32 {
    0.05
}

fn default_mouse_leeway() -> f32 {
    32.0
}

fn default_report_interval_frames() -> f32 {
    3.0
}

fn default_reconcile_threshold() -> f32 {
    2.0
}

fn default_failure_report_interval_ms() -> u64 {
    1000
}

fn default_frame_hz() -> u32 {
    60
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            player_name: default_player_name(),
            tile_size: default_tile_size(),
            character_speed: default_character_speed(),
            mouse_leeway: default_mouse_leeway(),
            report_interval_frames: default_report_interval_frames(),
            reconcile_threshold: default_reconcile_threshold(),
            failure_report_interval_ms: default_failure_report_interval_ms(),
            frame_hz: default_frame_hz(),
            viewport: Viewport::default(),
        }
    }
}

impl ClientConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Duration of one frame at `frame_hz`, in milliseconds.
    pub fn frame_ms(&self) -> f32 {
        1000.0 / self.frame_hz.max(1) as f32
    }
}

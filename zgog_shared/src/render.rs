//! Rendering abstraction.
//!
//! This crate does not depend on a graphics backend. The sync core produces a
//! [`FrameView`] each frame and a renderer applies it to whatever sprites it
//! owns.

use crate::math::Vec2;
use crate::net::PlayerId;

/// Where to draw one character this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SpritePlacement {
    pub id: PlayerId,
    /// Screen position in pixels.
    pub screen: Vec2,
    /// Rotation in radians.
    pub rotation: f32,
    pub hitting: bool,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameView {
    /// Local character, pinned to the screen centre.
    pub local: Option<SpritePlacement>,
    /// Remote characters, sorted by id.
    pub remotes: Vec<SpritePlacement>,
    /// Screen offset of the terrain layers.
    pub map_origin: Vec2,
    /// Side of one tile in pixels; sprites are one tile wide.
    pub tile_size: f32,
}

impl FrameView {
    pub fn remote(&self, id: &PlayerId) -> Option<&SpritePlacement> {
        self.remotes.iter().find(|p| &p.id == id)
    }
}

/// A minimal rendering API.
pub trait RenderBackend {
    fn draw(&mut self, frame: &FrameView);
}

/// A no-op renderer useful for headless tests.
#[derive(Default)]
pub struct NullRenderer {
    pub frames: u64,
}

impl RenderBackend for NullRenderer {
    fn draw(&mut self, _frame: &FrameView) {
        self.frames += 1;
    }
}

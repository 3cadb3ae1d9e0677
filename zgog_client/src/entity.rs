//! Per-character state.
//!
//! An [`Entity`] holds the authoritative values (as last told by the server,
//! or as simulated locally) plus the bookkeeping the interpolator needs:
//! the previous sample and the pose that was last put on screen.

use zgog_shared::{
    math::Vec2,
    net::{PlayerCoords, PlayerId, PlayerPayload},
};

/// Position and raw orientation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub position: Vec2,
    pub orientation: Vec2,
}

impl Pose {
    pub const fn new(position: Vec2, orientation: Vec2) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Interpolates both position and raw orientation components.
    pub fn lerp(self, to: Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(to.position, t),
            orientation: self.orientation.lerp(to.orientation, t),
        }
    }
}

/// A character known to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: PlayerId,
    pub name: String,

    pub position: Vec2,
    pub orientation: Vec2,
    pub velocity: Vec2,
    pub hitting: bool,

    /// Previous authoritative sample; interpolation starts here.
    pub last_snapshot: Pose,
    /// Pose drawn on the most recent frame.
    pub predicted: Pose,
}

impl Entity {
    /// First sighting: nothing to interpolate from, so every pose seeds from
    /// the snapshot itself.
    pub fn from_payload(payload: &PlayerPayload) -> Self {
        let pose = Pose::new(payload.position, payload.orientation);
        Self {
            id: payload.id.clone(),
            name: payload.name.clone(),
            position: payload.position,
            orientation: payload.orientation,
            velocity: payload.velocity,
            hitting: payload.hitting,
            last_snapshot: pose,
            predicted: pose,
        }
    }

    /// Current authoritative pose.
    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.orientation)
    }

    /// Folds a fresh snapshot in.
    ///
    /// The pose currently on screen becomes the interpolation start, so a
    /// snapshot that lands mid-interpolation never makes the sprite jump.
    pub fn apply_snapshot(&mut self, payload: &PlayerPayload) {
        self.last_snapshot = self.predicted;

        if !payload.name.is_empty() {
            self.name.clone_from(&payload.name);
        }
        self.position = payload.position;
        self.orientation = payload.orientation;
        self.velocity = payload.velocity;
        self.hitting = payload.hitting;
    }

    /// Outgoing report of this entity's state.
    pub fn report(&self) -> PlayerCoords {
        PlayerCoords {
            position: self.position,
            orientation: self.orientation,
            velocity: self.velocity,
            hitting: self.hitting,
        }
    }
}

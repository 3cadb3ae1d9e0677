//! Input handling.
//!
//! Pointer capture happens in the windowing layer; this module only turns an
//! already-sampled cursor position into the local character's velocity and
//! orientation. The cursor's offset from the screen centre steers: outside a
//! small dead zone each axis ramps up to full speed independently.

use zgog_shared::{
    config::{ClientConfig, Viewport},
    math::Vec2,
};

/// Steering parameters taken from [`ClientConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    pub speed: f32,
    pub leeway: f32,
    pub viewport: Viewport,
}

impl Steering {
    pub fn from_config(cfg: &ClientConfig) -> Self {
        Self {
            speed: cfg.character_speed,
            leeway: cfg.mouse_leeway,
            viewport: cfg.viewport,
        }
    }

    pub fn screen_centre(&self) -> Vec2 {
        Vec2::new(self.viewport.width / 2.0, self.viewport.height / 2.0)
    }

    /// Velocity for a cursor position in screen pixels.
    pub fn velocity(&self, cursor: Vec2) -> Vec2 {
        Vec2::new(
            axis_velocity(cursor.x, self.viewport.width, self.speed, self.leeway),
            axis_velocity(cursor.y, self.viewport.height, self.speed, self.leeway),
        )
    }

    /// Raw orientation: from the screen centre towards the cursor.
    pub fn orientation(&self, cursor: Vec2) -> Vec2 {
        cursor - self.screen_centre()
    }
}

/// Velocity along one axis.
///
/// `cursor` is the pointer coordinate on an axis of `extent` pixels. The
/// further from the centre, the faster, saturating at `speed` once the
/// cursor is within `extent / 1.2` of the opposite edge.
pub fn axis_velocity(cursor: f32, extent: f32, speed: f32, leeway: f32) -> f32 {
    let centre = extent / 2.0;
    if cursor > centre + leeway {
        speed * ramp(extent, cursor)
    } else if cursor < centre - leeway {
        -speed * ramp(extent, extent - cursor)
    } else {
        0.0
    }
}

fn ramp(extent: f32, reach: f32) -> f32 {
    if reach <= 0.0 {
        return 0.0;
    }
    2.0 - (extent / 1.2 / reach).max(1.0)
}

/// Edge detector for the attack button.
#[derive(Debug, Clone, Copy, Default)]
pub struct HitButton {
    down: bool,
}

impl HitButton {
    /// Returns true on the press edge only.
    pub fn press(&mut self) -> bool {
        !std::mem::replace(&mut self.down, true)
    }

    /// Returns true on the release edge only.
    pub fn release(&mut self) -> bool {
        std::mem::replace(&mut self.down, false)
    }

    pub fn is_down(&self) -> bool {
        self.down
    }
}

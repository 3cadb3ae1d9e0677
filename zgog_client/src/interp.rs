//! Interpolation.
//!
//! The server sends snapshot batches at an irregular cadence; the client
//! renders at its own rate. Each remote character is drawn between its
//! previous sample and its latest one, proportionally to how much render
//! time has passed compared to the gap between the last two batch arrivals.
//! Once that gap has fully elapsed the character sits exactly on the latest
//! sample: nothing is extrapolated.

use std::collections::HashMap;
use std::time::Duration;

use zgog_shared::{
    math::Vec2,
    net::PlayerId,
    render::SpritePlacement,
};

use crate::entity::{Entity, Pose};

/// Timing of snapshot batch arrivals.
///
/// `lag` is the gap between the two most recent arrivals; `elapsed` is the
/// render time accumulated since the latest one.
#[derive(Debug, Clone, Default)]
pub struct NetworkCadence {
    last_batch_at: Option<Duration>,
    before_last_batch_at: Option<Duration>,
    elapsed_ms: f32,
}

impl NetworkCadence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a batch arrival and restarts the elapsed clock.
    pub fn record_batch(&mut self, at: Duration) {
        self.before_last_batch_at = self.last_batch_at.replace(at);
        self.elapsed_ms = 0.0;
    }

    /// Adds one frame's worth of render time.
    pub fn advance(&mut self, elapsed_ms: f32) {
        self.elapsed_ms += elapsed_ms.max(0.0);
    }

    /// Gap between the two latest batches, once there have been two.
    pub fn lag_ms(&self) -> Option<f32> {
        let last = self.last_batch_at?;
        let before = self.before_last_batch_at?;
        Some(last.saturating_sub(before).as_micros() as f32 / 1000.0)
    }

    pub fn elapsed_ms(&self) -> f32 {
        self.elapsed_ms
    }

    /// Interpolation fraction in $[0,1]$.
    ///
    /// Without an established, non-zero lag there is nothing to interpolate
    /// over and the fraction is 1 (draw the authoritative sample).
    pub fn fraction(&self) -> f32 {
        match self.lag_ms() {
            Some(lag) if lag > 0.0 => (self.elapsed_ms / lag).min(1.0),
            _ => 1.0,
        }
    }
}

/// Pose to draw for `entity` at fraction `t`.
pub fn displayed_pose(entity: &Entity, t: f32) -> Pose {
    if t >= 1.0 {
        entity.pose()
    } else {
        entity.last_snapshot.lerp(entity.pose(), t)
    }
}

/// World to screen mapping, centred on the local character.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub screen_centre: Vec2,
    pub tile_size: f32,
    pub focus: Vec2,
}

impl Camera {
    pub fn to_screen(&self, world: Vec2) -> Vec2 {
        self.screen_centre + (world - self.focus) * self.tile_size
    }

    /// Where the map's top-left corner lands on screen.
    pub fn map_origin(&self) -> Vec2 {
        self.to_screen(Vec2::ZERO)
    }
}

/// Interpolates every remote entity for this frame.
///
/// Authoritative fields are left alone; only `predicted` is refreshed.
/// Placements come back sorted by id.
pub fn interpolate_remotes(
    remotes: &mut HashMap<PlayerId, Entity>,
    cadence: &NetworkCadence,
    camera: &Camera,
) -> Vec<SpritePlacement> {
    let t = cadence.fraction();
    let mut placements: Vec<SpritePlacement> = remotes
        .values_mut()
        .map(|entity| {
            let shown = displayed_pose(entity, t);
            entity.predicted = shown;
            SpritePlacement {
                id: entity.id.clone(),
                screen: camera.to_screen(shown.position),
                rotation: shown.orientation.sprite_rotation(),
                hitting: entity.hitting,
            }
        })
        .collect();
    placements.sort_by(|a, b| a.id.cmp(&b.id));
    placements
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use zgog_shared::net::PlayerPayload;

    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn entity_moving(from: Vec2, to: Vec2) -> Entity {
        let mut e = Entity::from_payload(&PlayerPayload::at("p1", from));
        e.apply_snapshot(&PlayerPayload::at("p1", to));
        e
    }

    #[test]
    fn first_batch_has_no_lag() {
        let mut c = NetworkCadence::new();
        c.record_batch(ms(40));
        c.advance(5.0);
        assert_eq!(c.lag_ms(), None);
        assert_eq!(c.fraction(), 1.0);
    }

    #[test]
    fn zero_lag_does_not_divide() {
        let mut c = NetworkCadence::new();
        c.record_batch(ms(40));
        c.record_batch(ms(40));
        assert_eq!(c.fraction(), 1.0);
        c.advance(10.0);
        assert!(!c.fraction().is_nan());
    }

    #[test]
    fn fraction_tracks_elapsed_over_lag() {
        let mut c = NetworkCadence::new();
        c.record_batch(ms(0));
        c.record_batch(ms(100));
        assert_eq!(c.fraction(), 0.0);
        c.advance(25.0);
        assert!((c.fraction() - 0.25).abs() < 1e-6);
        c.advance(500.0);
        assert_eq!(c.fraction(), 1.0);
    }

    #[test]
    fn new_batch_resets_elapsed() {
        let mut c = NetworkCadence::new();
        c.record_batch(ms(0));
        c.advance(80.0);
        c.record_batch(ms(80));
        assert_eq!(c.elapsed_ms(), 0.0);
        assert_eq!(c.lag_ms(), Some(80.0));
    }

    #[test]
    fn displayed_pose_interpolates_orientation_components() {
        let mut e = entity_moving(Vec2::ZERO, Vec2::new(10.0, 0.0));
        e.last_snapshot.orientation = Vec2::new(1.0, 0.0);
        e.orientation = Vec2::new(0.0, 1.0);
        let shown = displayed_pose(&e, 0.5);
        assert_eq!(shown.position, Vec2::new(5.0, 0.0));
        assert_eq!(shown.orientation, Vec2::new(0.5, 0.5));
    }

    #[test]
    fn saturated_fraction_is_exactly_authoritative() {
        let e = entity_moving(Vec2::new(0.1, 0.2), Vec2::new(9.7, 3.3));
        assert_eq!(displayed_pose(&e, 1.0), e.pose());
    }

    #[test]
    fn camera_is_centred_on_focus() {
        let camera = Camera {
            screen_centre: Vec2::new(640.0, 360.0),
            tile_size: 64.0,
            focus: Vec2::new(5.0, 5.0),
        };
        assert_eq!(camera.to_screen(Vec2::new(5.0, 5.0)), Vec2::new(640.0, 360.0));
        assert_eq!(camera.to_screen(Vec2::new(6.0, 4.0)), Vec2::new(704.0, 296.0));
        assert_eq!(camera.map_origin(), Vec2::new(320.0, 40.0));
    }

    #[test]
    fn interpolation_refreshes_predicted_only() {
        let mut remotes = HashMap::new();
        let mut e = entity_moving(Vec2::ZERO, Vec2::new(10.0, 0.0));
        e.orientation = Vec2::new(1.0, 0.0);
        e.last_snapshot.orientation = Vec2::new(1.0, 0.0);
        remotes.insert(e.id.clone(), e);

        let mut cadence = NetworkCadence::new();
        cadence.record_batch(ms(0));
        cadence.record_batch(ms(100));
        cadence.advance(50.0);

        let camera = Camera {
            screen_centre: Vec2::ZERO,
            tile_size: 1.0,
            focus: Vec2::ZERO,
        };
        let placements = interpolate_remotes(&mut remotes, &cadence, &camera);

        let e = &remotes[&PlayerId::new("p1")];
        assert_eq!(e.position, Vec2::new(10.0, 0.0));
        assert_eq!(e.predicted.position, Vec2::new(5.0, 0.0));
        assert_eq!(placements[0].screen, Vec2::new(5.0, 0.0));
        assert!((placements[0].rotation - FRAC_PI_2).abs() < 1e-6);
    }

    proptest::proptest! {
        #[test]
        fn displayed_position_stays_on_segment(
            ax in -100.0f32..100.0, ay in -100.0f32..100.0,
            bx in -100.0f32..100.0, by in -100.0f32..100.0,
            lag in 1u64..500, elapsed in 0.0f32..1000.0,
        ) {
            let e = entity_moving(Vec2::new(ax, ay), Vec2::new(bx, by));
            let mut cadence = NetworkCadence::new();
            cadence.record_batch(ms(0));
            cadence.record_batch(ms(lag));
            cadence.advance(elapsed);

            let shown = displayed_pose(&e, cadence.fraction()).position;
            let eps = 1e-3;
            proptest::prop_assert!(shown.x >= ax.min(bx) - eps && shown.x <= ax.max(bx) + eps);
            proptest::prop_assert!(shown.y >= ay.min(by) - eps && shown.y <= ay.max(by) + eps);
            if elapsed > lag as f32 {
                proptest::prop_assert_eq!(shown, Vec2::new(bx, by));
            }
        }
    }
}

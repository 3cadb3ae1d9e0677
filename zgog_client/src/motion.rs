//! Local motion.
//!
//! The local character is simulated immediately from its velocity every
//! frame instead of waiting for the server. Movement is clamped to the map
//! and checked against walkability one axis at a time, so pushing into a wall
//! at an angle slides along it instead of stopping dead.

use tracing::trace;
use zgog_shared::{map::WalkabilityMap, math::Vec2, net::PlayerCoords};

use crate::entity::Entity;

/// Length of one nominal frame; frame deltas are expressed in these units.
pub const NOMINAL_FRAME_MS: f32 = 1000.0 / 60.0;

/// Which axes a step was allowed to move along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisMove {
    Both,
    XOnly,
    YOnly,
    Blocked,
}

/// Computes the next position for one frame.
///
/// The candidate `position + velocity * delta` is clamped into
/// `[0, extent]`, then the tiles at `(new.x, old.y)` and `(old.x, new.y)` are
/// checked before either axis is committed.
pub fn step_position(
    position: Vec2,
    velocity: Vec2,
    delta: f32,
    map: &WalkabilityMap,
) -> (Vec2, AxisMove) {
    let candidate = (position + velocity * delta).clamp(Vec2::ZERO, map.extent());

    let x_ok = map.is_walkable_at(Vec2::new(candidate.x, position.y));
    let y_ok = map.is_walkable_at(Vec2::new(position.x, candidate.y));

    match (x_ok, y_ok) {
        (true, true) => (candidate, AxisMove::Both),
        (_, true) => (Vec2::new(position.x, candidate.y), AxisMove::YOnly),
        (true, _) => (Vec2::new(candidate.x, position.y), AxisMove::XOnly),
        _ => (position, AxisMove::Blocked),
    }
}

/// Frame-rate independent throttle for outgoing reports.
#[derive(Debug, Clone)]
pub struct ReportThrottle {
    every_frames: f32,
    accumulated: f32,
}

impl ReportThrottle {
    pub fn new(every_frames: f32) -> Self {
        Self {
            every_frames,
            accumulated: 0.0,
        }
    }

    /// Adds `delta` frames; true when a report is due.
    pub fn tick(&mut self, delta: f32) -> bool {
        self.accumulated += delta;
        if self.accumulated >= self.every_frames {
            self.accumulated = 0.0;
            true
        } else {
            false
        }
    }
}

/// Simulator for the locally controlled character.
#[derive(Debug, Clone)]
pub struct LocalMotion {
    throttle: ReportThrottle,
}

impl LocalMotion {
    pub fn new(report_interval_frames: f32) -> Self {
        Self {
            throttle: ReportThrottle::new(report_interval_frames),
        }
    }

    /// Moves `local` by one frame and returns a report when one is due.
    ///
    /// Only this method writes the local character's position.
    pub fn advance(
        &mut self,
        local: &mut Entity,
        delta: f32,
        map: &WalkabilityMap,
    ) -> Option<PlayerCoords> {
        let (next, axes) = step_position(local.position, local.velocity, delta, map);
        if axes != AxisMove::Both && local.velocity != Vec2::ZERO {
            trace!(?axes, x = next.x, y = next.y, "Local move clipped");
        }
        local.position = next;
        local.predicted = local.pose();

        self.throttle.tick(delta).then(|| local.report())
    }
}

#[cfg(test)]
mod tests {
    use zgog_shared::{map::TileCoord, net::PlayerPayload};

    use super::*;

    fn local_at(x: f32, y: f32, velocity: Vec2) -> Entity {
        let mut payload = PlayerPayload::at("me", Vec2::new(x, y));
        payload.velocity = velocity;
        Entity::from_payload(&payload)
    }

    #[test]
    fn moves_by_velocity_times_delta() {
        let map = WalkabilityMap::open(10, 10);
        let (next, axes) = step_position(Vec2::new(5.0, 5.0), Vec2::new(1.0, 0.0), 1.0, &map);
        assert_eq!(next, Vec2::new(6.0, 5.0));
        assert_eq!(axes, AxisMove::Both);
    }

    #[test]
    fn slides_along_blocked_axis() {
        let mut map = WalkabilityMap::open(10, 10);
        map.set(TileCoord::new(6, 5), false);
        let (next, axes) = step_position(Vec2::new(5.5, 5.5), Vec2::new(1.0, 1.0), 1.0, &map);
        assert_eq!(axes, AxisMove::YOnly);
        assert_eq!(next, Vec2::new(5.5, 6.5));
    }

    #[test]
    fn x_only_when_y_blocked() {
        let mut map = WalkabilityMap::open(10, 10);
        map.set(TileCoord::new(5, 6), false);
        let (next, axes) = step_position(Vec2::new(5.5, 5.5), Vec2::new(1.0, 1.0), 1.0, &map);
        assert_eq!(axes, AxisMove::XOnly);
        assert_eq!(next, Vec2::new(6.5, 5.5));
    }

    #[test]
    fn stops_when_both_blocked() {
        let mut map = WalkabilityMap::open(10, 10);
        map.set(TileCoord::new(6, 5), false);
        map.set(TileCoord::new(5, 6), false);
        let (next, axes) = step_position(Vec2::new(5.5, 5.5), Vec2::new(1.0, 1.0), 1.0, &map);
        assert_eq!(axes, AxisMove::Blocked);
        assert_eq!(next, Vec2::new(5.5, 5.5));
    }

    #[test]
    fn clamps_to_map_extent() {
        let map = WalkabilityMap::open(10, 10);
        let (next, _) = step_position(Vec2::new(9.5, 0.5), Vec2::new(50.0, -50.0), 4.0, &map);
        assert_eq!(next, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn reports_every_three_frames() {
        let map = WalkabilityMap::open(10, 10);
        let mut motion = LocalMotion::new(3.0);
        let mut local = local_at(1.0, 1.0, Vec2::new(0.05, 0.0));

        let due: Vec<bool> = (0..9)
            .map(|_| motion.advance(&mut local, 1.0, &map).is_some())
            .collect();
        assert_eq!(
            due,
            [false, false, true, false, false, true, false, false, true]
        );
    }

    #[test]
    fn report_carries_current_state() {
        let map = WalkabilityMap::open(10, 10);
        let mut motion = LocalMotion::new(1.0);
        let mut local = local_at(1.0, 1.0, Vec2::new(0.5, 0.0));
        local.hitting = true;

        let report = motion.advance(&mut local, 1.0, &map).unwrap();
        assert_eq!(report.position, Vec2::new(1.5, 1.0));
        assert!(report.hitting);
        assert_eq!(local.predicted.position, Vec2::new(1.5, 1.0));
    }

    #[test]
    fn throttle_follows_frame_time_not_frame_count() {
        let mut throttle = ReportThrottle::new(3.0);
        assert!(!throttle.tick(2.0));
        assert!(throttle.tick(2.0));
        assert!(!throttle.tick(0.5));
    }

    proptest::proptest! {
        #[test]
        fn never_leaves_the_map(
            x in 0.0f32..=10.0, y in 0.0f32..=10.0,
            vx in -1000.0f32..1000.0, vy in -1000.0f32..1000.0,
            delta in 0.0f32..100.0,
        ) {
            let map = WalkabilityMap::open(10, 10);
            let (next, _) = step_position(Vec2::new(x, y), Vec2::new(vx, vy), delta, &map);
            proptest::prop_assert!((0.0..=10.0).contains(&next.x));
            proptest::prop_assert!((0.0..=10.0).contains(&next.y));
        }
    }
}

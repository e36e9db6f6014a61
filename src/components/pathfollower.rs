//! Waypoint path follower.
//!
//! A [`PathFollower`] moves its entity's
//! [`MapPosition`](super::mapposition::MapPosition) along a list of waypoints
//! at constant speed. Each pair of consecutive waypoints is a [`Segment`];
//! the position is linearly interpolated across the segment over
//! `distance / speed` seconds of world time, then the next segment begins.
//! At the last waypoint the follower either wraps back to waypoint 0
//! (`looped`) or stops.
//!
//! While moving in the XY plane the follower can pin depth to
//! `z_lock_value`, and it reports a four-way [`Facing`] for each segment to
//! an [`Animator`](super::animator::Animator). See
//! [`crate::systems::pathfollower`] for the update systems.

use bevy_ecs::prelude::Component;
use raylib::prelude::Vector3;

use super::audiosource::AudioClip;

/// Slowest allowed speed, in units per second.
pub const MIN_SPEED: f32 = 0.01;
/// Speed used by the divisor when computing segment durations.
const DURATION_SPEED_FLOOR: f32 = 0.001;
/// Shortest possible segment, in seconds.
const MIN_SEGMENT_DURATION: f32 = 0.0001;
/// Displacements with a squared length below this don't change facing.
const FACING_EPSILON_SQ: f32 = 1e-6;

/// Four-way facing, encoded the way the animation rows are laid out.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum Facing {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Facing {
    /// Classify a displacement, or `None` if it is too small to tell.
    ///
    /// The dominant axis wins; equal magnitudes resolve vertically.
    pub fn from_displacement(d: Vector3) -> Option<Facing> {
        if length_sq(d) < FACING_EPSILON_SQ {
            return None;
        }
        if d.x.abs() > d.y.abs() {
            Some(if d.x > 0.0 { Facing::Right } else { Facing::Left })
        } else {
            Some(if d.y > 0.0 { Facing::Up } else { Facing::Down })
        }
    }

    pub fn as_param(self) -> i32 {
        self as i32
    }

    pub fn from_param(value: i32) -> Option<Facing> {
        match value {
            0 => Some(Facing::Up),
            1 => Some(Facing::Right),
            2 => Some(Facing::Down),
            3 => Some(Facing::Left),
            _ => None,
        }
    }
}

/// Motion between two consecutive waypoints.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub from_index: usize,
    pub to_index: usize,
    /// Sanitized start point.
    pub from: Vector3,
    /// Sanitized end point.
    pub to: Vector3,
    /// World time (seconds) when the segment began.
    pub start_time: f32,
    /// Seconds needed to cover the segment.
    pub duration: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FollowerState {
    /// Not activated, or deactivated.
    Idle,
    Advancing(Segment),
    /// Reached the end of a non-looping path.
    Stopped,
}

/// Outcome of completing a segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Advance {
    /// A new segment began; carries the facing to report, if any.
    Next(Option<Facing>),
    /// End of a non-looping path.
    Finished,
}

#[derive(Component, Clone, Debug)]
pub struct PathFollower {
    pub waypoints: Vec<Vector3>,
    /// Units per second.
    pub speed: f32,
    /// Wrap to waypoint 0 after the last one instead of stopping.
    pub looped: bool,
    /// Clip played on the entity's [`AudioSource`](super::audiosource::AudioSource) while moving.
    pub move_clip: Option<AudioClip>,
    pub loop_move_sfx: bool,
    pub lock_z: bool,
    pub z_lock_value: f32,
    /// Draw the path when rendering.
    pub draw_gizmos: bool,
    /// Clearing this deactivates the follower on the next tick.
    pub enabled: bool,
    pub state: FollowerState,
}

impl PathFollower {
    pub fn new(waypoints: Vec<Vector3>) -> Self {
        PathFollower {
            waypoints,
            speed: 3.0,
            looped: true,
            move_clip: None,
            loop_move_sfx: true,
            lock_z: true,
            z_lock_value: 0.0,
            draw_gizmos: true,
            enabled: true,
            state: FollowerState::Idle,
        }
    }
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed.max(MIN_SPEED);
        self
    }
    pub fn with_loop(mut self, looped: bool) -> Self {
        self.looped = looped;
        self
    }
    pub fn with_move_clip(mut self, clip: AudioClip) -> Self {
        self.move_clip = Some(clip);
        self
    }
    pub fn with_loop_move_sfx(mut self, looped: bool) -> Self {
        self.loop_move_sfx = looped;
        self
    }
    pub fn with_z_lock(mut self, value: f32) -> Self {
        self.lock_z = true;
        self.z_lock_value = value;
        self
    }
    pub fn without_z_lock(mut self) -> Self {
        self.lock_z = false;
        self
    }
    pub fn with_gizmos(mut self, draw: bool) -> Self {
        self.draw_gizmos = draw;
        self
    }

    /// At least two waypoints are needed to move at all.
    pub fn can_move(&self) -> bool {
        self.waypoints.len() >= 2
    }

    pub fn is_advancing(&self) -> bool {
        matches!(self.state, FollowerState::Advancing(_))
    }

    pub fn segment(&self) -> Option<&Segment> {
        match &self.state {
            FollowerState::Advancing(seg) => Some(seg),
            _ => None,
        }
    }

    /// Apply the depth lock, then replace non-finite points with the fallback.
    pub fn sanitize(&self, v: Vector3) -> Vector3 {
        let mut v = v;
        if self.lock_z {
            v.z = self.z_lock_value;
        }
        if !is_finite(v) {
            v = Vector3 {
                x: 0.0,
                y: 0.0,
                z: self.z_lock_value,
            };
        }
        v
    }

    /// Start moving from waypoint `from_index` toward `to_index` at time `now`.
    ///
    /// Returns the facing of the new segment, if its displacement is large
    /// enough to classify.
    pub fn begin_segment(&mut self, from_index: usize, to_index: usize, now: f32) -> Option<Facing> {
        let from = self.sanitize(self.waypoints[from_index]);
        let to = self.sanitize(self.waypoints[to_index]);
        let duration = segment_duration(planar_distance(from, to), self.speed);
        self.state = FollowerState::Advancing(Segment {
            from_index,
            to_index,
            from,
            to,
            start_time: now,
            duration,
        });
        Facing::from_displacement(sub(to, from))
    }

    /// Progress through the current segment in [0, 1].
    pub fn fraction(&self, now: f32) -> Option<f32> {
        self.segment()
            .map(|seg| ((now - seg.start_time) / seg.duration).clamp(0.0, 1.0))
    }

    /// Sanitized position at time `now`, if a segment is in progress.
    pub fn position_at(&self, now: f32) -> Option<Vector3> {
        let seg = self.segment()?;
        let t = self.fraction(now)?;
        // land exactly on the waypoint, lerp rounding can miss it
        let p = if t >= 1.0 { seg.to } else { lerp_v3(seg.from, seg.to, t) };
        Some(self.sanitize(p))
    }

    /// Move on from a completed segment.
    ///
    /// Past the last waypoint this wraps to waypoint 0 when looping;
    /// otherwise the follower is disabled and [`Advance::Finished`] returned.
    pub fn advance(&mut self, now: f32) -> Advance {
        let Some(seg) = self.segment().copied() else {
            return Advance::Finished;
        };
        let from_index = seg.to_index;
        let mut to_index = seg.to_index + 1;
        if to_index >= self.waypoints.len() {
            if self.looped {
                to_index = 0;
            } else {
                self.state = FollowerState::Stopped;
                self.enabled = false;
                return Advance::Finished;
            }
        }
        Advance::Next(self.begin_segment(from_index, to_index, now))
    }

    /// Sanitized waypoints, as drawn by the path gizmos.
    pub fn gizmo_points(&self) -> Vec<Vector3> {
        self.waypoints.iter().map(|p| self.sanitize(*p)).collect()
    }

    /// Lines between consecutive waypoints, closing back to the first.
    pub fn gizmo_edges(&self) -> Vec<(Vector3, Vector3)> {
        if self.waypoints.len() < 2 {
            return Vec::new();
        }
        let n = self.waypoints.len();
        (0..n)
            .map(|i| {
                (
                    self.sanitize(self.waypoints[i]),
                    self.sanitize(self.waypoints[(i + 1) % n]),
                )
            })
            .collect()
    }
}

/// Seconds needed to cover `distance` at `speed`, always finite and positive.
pub fn segment_duration(distance: f32, speed: f32) -> f32 {
    (distance / speed.max(DURATION_SPEED_FLOOR)).max(MIN_SEGMENT_DURATION)
}

/// Distance in the XY plane; depth is ignored.
pub fn planar_distance(a: Vector3, b: Vector3) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

/// Linearly interpolate between two 3D vectors.
pub(crate) fn lerp_v3(a: Vector3, b: Vector3, t: f32) -> Vector3 {
    Vector3 {
        x: a.x + (b.x - a.x) * t,
        y: a.y + (b.y - a.y) * t,
        z: a.z + (b.z - a.z) * t,
    }
}

fn sub(a: Vector3, b: Vector3) -> Vector3 {
    Vector3 {
        x: a.x - b.x,
        y: a.y - b.y,
        z: a.z - b.z,
    }
}

fn length_sq(v: Vector3) -> f32 {
    v.x * v.x + v.y * v.y + v.z * v.z
}

fn is_finite(v: Vector3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn v3(x: f32, y: f32, z: f32) -> Vector3 {
        Vector3 { x, y, z }
    }

    fn square() -> PathFollower {
        PathFollower::new(vec![
            v3(0.0, 0.0, 0.0),
            v3(4.0, 0.0, 0.0),
            v3(4.0, -4.0, 0.0),
            v3(0.0, -4.0, 0.0),
        ])
        .with_speed(2.0)
    }

    // ==================== CONSTRUCTION ====================

    #[test]
    fn test_new_defaults() {
        let pf = PathFollower::new(vec![]);
        assert!(approx_eq(pf.speed, 3.0));
        assert!(pf.looped);
        assert!(pf.loop_move_sfx);
        assert!(pf.lock_z);
        assert!(approx_eq(pf.z_lock_value, 0.0));
        assert!(pf.draw_gizmos);
        assert!(pf.enabled);
        assert_eq!(pf.state, FollowerState::Idle);
        assert!(pf.move_clip.is_none());
    }

    #[test]
    fn test_with_speed_clamps_to_minimum() {
        let pf = PathFollower::new(vec![]).with_speed(0.0);
        assert!(approx_eq(pf.speed, MIN_SPEED));
    }

    #[test]
    fn test_can_move_requires_two_points() {
        assert!(!PathFollower::new(vec![]).can_move());
        assert!(!PathFollower::new(vec![v3(1.0, 1.0, 0.0)]).can_move());
        assert!(PathFollower::new(vec![v3(0.0, 0.0, 0.0), v3(1.0, 0.0, 0.0)]).can_move());
    }

    // ==================== SANITIZE ====================

    #[test]
    fn test_sanitize_locks_depth() {
        let pf = PathFollower::new(vec![]).with_z_lock(-2.0);
        let v = pf.sanitize(v3(1.0, 2.0, 7.0));
        assert_eq!(v, v3(1.0, 2.0, -2.0));
    }

    #[test]
    fn test_sanitize_without_lock_keeps_depth() {
        let pf = PathFollower::new(vec![]).without_z_lock();
        assert_eq!(pf.sanitize(v3(1.0, 2.0, 7.0)), v3(1.0, 2.0, 7.0));
    }

    #[test]
    fn test_sanitize_non_finite_falls_back() {
        let pf = PathFollower::new(vec![]).with_z_lock(5.0);
        assert_eq!(pf.sanitize(v3(f32::NAN, 2.0, 0.0)), v3(0.0, 0.0, 5.0));
        assert_eq!(pf.sanitize(v3(1.0, f32::INFINITY, 0.0)), v3(0.0, 0.0, 5.0));
    }

    #[test]
    fn test_sanitize_non_finite_depth_without_lock_falls_back() {
        let pf = PathFollower::new(vec![]).without_z_lock();
        assert_eq!(
            pf.sanitize(v3(1.0, 2.0, f32::NEG_INFINITY)),
            v3(0.0, 0.0, 0.0)
        );
    }

    // ==================== DURATION ====================

    #[test]
    fn test_segment_duration_is_distance_over_speed() {
        assert!(approx_eq(segment_duration(10.0, 4.0), 2.5));
    }

    #[test]
    fn test_segment_duration_zero_distance_is_positive() {
        assert!(segment_duration(0.0, 3.0) > 0.0);
    }

    #[test]
    fn test_segment_duration_zero_speed_is_finite() {
        let d = segment_duration(1.0, 0.0);
        assert!(d.is_finite());
        assert!((d - 1000.0).abs() < 0.01);
    }

    #[test]
    fn test_planar_distance_ignores_depth() {
        assert!(approx_eq(
            planar_distance(v3(0.0, 0.0, 0.0), v3(3.0, 4.0, 100.0)),
            5.0
        ));
    }

    // ==================== FACING ====================

    #[test]
    fn test_facing_horizontal() {
        assert_eq!(
            Facing::from_displacement(v3(2.0, 1.0, 0.0)),
            Some(Facing::Right)
        );
        assert_eq!(
            Facing::from_displacement(v3(-2.0, 1.0, 0.0)),
            Some(Facing::Left)
        );
    }

    #[test]
    fn test_facing_vertical() {
        assert_eq!(Facing::from_displacement(v3(0.5, 1.0, 0.0)), Some(Facing::Up));
        assert_eq!(
            Facing::from_displacement(v3(0.5, -1.0, 0.0)),
            Some(Facing::Down)
        );
    }

    #[test]
    fn test_facing_tie_favours_vertical() {
        assert_eq!(Facing::from_displacement(v3(1.0, 1.0, 0.0)), Some(Facing::Up));
        assert_eq!(
            Facing::from_displacement(v3(-1.0, -1.0, 0.0)),
            Some(Facing::Down)
        );
    }

    #[test]
    fn test_facing_negligible_displacement() {
        assert_eq!(Facing::from_displacement(v3(0.0005, 0.0, 0.0)), None);
        assert_eq!(Facing::from_displacement(v3(0.0, 0.0, 0.0)), None);
    }

    #[test]
    fn test_facing_param_encoding() {
        assert_eq!(Facing::Up.as_param(), 0);
        assert_eq!(Facing::Right.as_param(), 1);
        assert_eq!(Facing::Down.as_param(), 2);
        assert_eq!(Facing::Left.as_param(), 3);
        assert_eq!(Facing::from_param(3), Some(Facing::Left));
        assert_eq!(Facing::from_param(4), None);
    }

    // ==================== SEGMENTS ====================

    #[test]
    fn test_begin_segment_reports_facing() {
        let mut pf = square();
        let facing = pf.begin_segment(0, 1, 0.0);
        assert_eq!(facing, Some(Facing::Right));
        let seg = pf.segment().unwrap();
        assert_eq!(seg.from_index, 0);
        assert_eq!(seg.to_index, 1);
        assert!(approx_eq(seg.duration, 2.0));
    }

    #[test]
    fn test_fraction_is_clamped() {
        let mut pf = square();
        pf.begin_segment(0, 1, 10.0);
        assert!(approx_eq(pf.fraction(9.0).unwrap(), 0.0));
        assert!(approx_eq(pf.fraction(11.0).unwrap(), 0.5));
        assert!(approx_eq(pf.fraction(50.0).unwrap(), 1.0));
    }

    #[test]
    fn test_position_never_overshoots() {
        let mut pf = square();
        pf.begin_segment(0, 1, 0.0);
        let p = pf.position_at(100.0).unwrap();
        assert_eq!(p, v3(4.0, 0.0, 0.0));
    }

    #[test]
    fn test_fraction_without_segment_is_none() {
        let pf = square();
        assert!(pf.fraction(1.0).is_none());
        assert!(pf.position_at(1.0).is_none());
    }

    #[test]
    fn test_advance_walks_the_path() {
        let mut pf = square();
        pf.begin_segment(0, 1, 0.0);
        assert_eq!(pf.advance(2.0), Advance::Next(Some(Facing::Down)));
        assert_eq!(pf.advance(4.0), Advance::Next(Some(Facing::Left)));
        let seg = pf.segment().unwrap();
        assert_eq!((seg.from_index, seg.to_index), (2, 3));
        assert!(approx_eq(seg.start_time, 4.0));
    }

    #[test]
    fn test_advance_wraps_when_looped() {
        let mut pf = square();
        pf.begin_segment(2, 3, 0.0);
        assert_eq!(pf.advance(2.0), Advance::Next(Some(Facing::Up)));
        let seg = pf.segment().unwrap();
        assert_eq!((seg.from_index, seg.to_index), (3, 0));
        pf.advance(4.0);
        let seg = pf.segment().unwrap();
        assert_eq!((seg.from_index, seg.to_index), (0, 1));
    }

    #[test]
    fn test_advance_stops_at_end_when_not_looped() {
        let mut pf = square().with_loop(false);
        pf.begin_segment(2, 3, 0.0);
        assert_eq!(pf.advance(2.0), Advance::Finished);
        assert_eq!(pf.state, FollowerState::Stopped);
        assert!(!pf.enabled);
    }

    #[test]
    fn test_repeated_waypoint_keeps_facing_unset() {
        let mut pf = PathFollower::new(vec![v3(1.0, 1.0, 0.0), v3(1.0, 1.0, 0.0)]);
        assert_eq!(pf.begin_segment(0, 1, 0.0), None);
    }

    // ==================== GIZMOS ====================

    #[test]
    fn test_gizmo_edges_close_the_loop() {
        let pf = square();
        let edges = pf.gizmo_edges();
        assert_eq!(edges.len(), 4);
        assert_eq!(edges[3], (v3(0.0, -4.0, 0.0), v3(0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_gizmos_empty_for_single_point() {
        let pf = PathFollower::new(vec![v3(1.0, 1.0, 0.0)]);
        assert!(pf.gizmo_edges().is_empty());
        assert_eq!(pf.gizmo_points().len(), 1);
    }

    #[test]
    fn test_lerp_v3_midpoint() {
        let p = lerp_v3(v3(0.0, 0.0, 0.0), v3(10.0, -20.0, 4.0), 0.5);
        assert_eq!(p, v3(5.0, -10.0, 2.0));
    }
}

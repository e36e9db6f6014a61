//! Path follower systems.
//!
//! - [`path_follower_awake_system`] pins the depth of freshly added followers.
//! - [`path_follower_system`] activates, advances and deactivates followers.
//!
//! Each tick, for every [`PathFollower`]:
//! - disabled while moving: deactivate, stop the movement sound;
//! - enabled but not moving: activate if there are at least two waypoints
//!   (segment 0 → 1, movement sound on), otherwise stay inert;
//! - moving: set the position from the segment fraction and, once the
//!   fraction reaches 1, begin the next segment or finish the path.
//!
//! Facing changes go to the entity's [`Animator`] when it has one; the
//! movement sound plays on the entity's [`AudioSource`] when it has one.

use bevy_ecs::prelude::*;
use log::debug;

use crate::components::animator::{Animator, DIRECTION_PARAM};
use crate::components::audiosource::AudioSource;
use crate::components::mapposition::MapPosition;
use crate::components::pathfollower::{Advance, Facing, FollowerState, PathFollower};
use crate::events::audio::AudioCmd;
use crate::resources::worldtime::WorldTime;

/// Apply the depth lock to followers added since the last run.
pub fn path_follower_awake_system(
    mut query: Query<(&PathFollower, &mut MapPosition), Added<PathFollower>>,
) {
    for (follower, mut position) in query.iter_mut() {
        if follower.lock_z {
            position.pos.z = follower.z_lock_value;
        }
    }
}

pub fn path_follower_system(
    time: Res<WorldTime>,
    mut query: Query<(
        Entity,
        &mut PathFollower,
        &mut MapPosition,
        Option<&mut Animator>,
        Option<&mut AudioSource>,
    )>,
    mut audio: MessageWriter<AudioCmd>,
) {
    let now = time.elapsed;
    for (entity, mut follower, mut position, mut animator, mut sink) in query.iter_mut() {
        if !follower.enabled {
            if follower.is_advancing() {
                debug!("path follower {:?} disabled", entity);
                follower.state = FollowerState::Idle;
                stop_move_sfx(sink.as_deref_mut(), &mut audio);
            }
            continue;
        }

        if !follower.is_advancing() {
            if !follower.can_move() {
                continue;
            }
            debug!(
                "path follower {:?} activated with {} waypoints",
                entity,
                follower.waypoints.len()
            );
            let facing = follower.begin_segment(0, 1, now);
            set_facing(animator.as_deref_mut(), facing);
            start_move_sfx(&follower, sink.as_deref_mut(), &mut audio);
        }

        let (Some(t), Some(p)) = (follower.fraction(now), follower.position_at(now)) else {
            continue;
        };
        position.pos = p;

        if t >= 1.0 {
            match follower.advance(now) {
                Advance::Next(facing) => set_facing(animator.as_deref_mut(), facing),
                Advance::Finished => {
                    debug!("path follower {:?} reached the end", entity);
                    stop_move_sfx(sink.as_deref_mut(), &mut audio);
                }
            }
        }
    }
}

fn set_facing(animator: Option<&mut Animator>, facing: Option<Facing>) {
    if let (Some(animator), Some(facing)) = (animator, facing) {
        animator.set_integer(DIRECTION_PARAM, facing.as_param());
    }
}

fn start_move_sfx(
    follower: &PathFollower,
    sink: Option<&mut AudioSource>,
    audio: &mut MessageWriter<AudioCmd>,
) {
    let (Some(clip), Some(sink)) = (follower.move_clip.as_ref(), sink) else {
        return;
    };
    sink.clip = Some(clip.clone());
    sink.looped = follower.loop_move_sfx;
    if !sink.is_playing() {
        sink.play(audio);
    }
}

fn stop_move_sfx(sink: Option<&mut AudioSource>, audio: &mut MessageWriter<AudioCmd>) {
    if let Some(sink) = sink {
        if sink.is_playing() {
            sink.stop(audio);
        }
    }
}

//! Keyboard shortcuts for the demo window.
//!
//! - F11 toggles the [`DebugMode`] overlay (path gizmos included).
//! - Space enables/disables every [`PathFollower`]; disabling stops the
//!   movement sound, enabling restarts the path from waypoint 0.

use bevy_ecs::prelude::*;
use log::info;
use raylib::prelude::{KeyboardKey, RaylibHandle};

use crate::components::pathfollower::PathFollower;
use crate::resources::debugmode::DebugMode;

pub fn debug_toggle_system(
    rl: NonSend<RaylibHandle>,
    debug: Option<Res<DebugMode>>,
    mut commands: Commands,
) {
    if !rl.is_key_pressed(KeyboardKey::KEY_F11) {
        return;
    }
    if debug.is_some() {
        info!("debug mode off");
        commands.remove_resource::<DebugMode>();
    } else {
        info!("debug mode on");
        commands.insert_resource(DebugMode {});
    }
}

pub fn follower_toggle_system(rl: NonSend<RaylibHandle>, mut query: Query<&mut PathFollower>) {
    if !rl.is_key_pressed(KeyboardKey::KEY_SPACE) {
        return;
    }
    for mut follower in query.iter_mut() {
        follower.enabled = !follower.enabled;
    }
}

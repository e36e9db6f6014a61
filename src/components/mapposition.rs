//! World-space position of an entity.
//!
//! Positions are three-dimensional so that 2D movement on a 3D transform can
//! keep its depth pinned (see [`PathFollower`](super::pathfollower::PathFollower)).
//! The renderer ignores `z`.

use bevy_ecs::prelude::Component;
use raylib::prelude::Vector3;

#[derive(Component, Clone, Copy, Debug)]
pub struct MapPosition {
    pub pos: Vector3,
}

impl MapPosition {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        MapPosition {
            pos: Vector3 { x, y, z },
        }
    }
}

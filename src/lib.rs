//! Wayfarer library.
//!
//! Background music sequencing and waypoint path following as ECS
//! components and systems. Exposed as a library for the binary and the
//! integration tests.

pub mod components;
pub mod events;
pub mod game;
pub mod resources;
pub mod systems;

//! Engine systems.
//!
//! Submodules overview
//! - [`audio`] – audio thread and the systems bridging it with the ECS
//! - [`bgmsequencer`] – intro-then-loop music sequencing
//! - [`input`] – keyboard shortcuts for the demo window
//! - [`pathfollower`] – waypoint following, facing and movement sound
//! - [`render`] – draw followers and debug gizmos using raylib
//! - [`time`] – advance the world clock

pub mod audio;
pub mod bgmsequencer;
pub mod input;
pub mod pathfollower;
pub mod render;
pub mod time;

//! ECS components for entities.
//!
//! Components hold the per-entity data the systems work on. Behaviours are
//! plain components; the systems in [`crate::systems`] advance them once per
//! frame.
//!
//! Submodules overview:
//! - [`animator`] – named integer parameters read by the animation side
//! - [`audiosource`] – audio output sink plus clip references
//! - [`bgmsequencer`] – intro-then-loop background music
//! - [`mapposition`] – world-space position of an entity
//! - [`pathfollower`] – constant-speed movement along waypoints

pub mod animator;
pub mod audiosource;
pub mod bgmsequencer;
pub mod mapposition;
pub mod pathfollower;

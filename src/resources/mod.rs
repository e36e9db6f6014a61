//! ECS resources made available to systems.
//!
//! Overview
//! - `audio` – bridge and channels for the background audio thread
//! - `debugmode` – presence toggles the debug overlay
//! - `gameconfig` – window, render and scene settings from `config.ini`
//! - `worldtime` – simulation time and delta
pub mod audio;
pub mod debugmode;
pub mod gameconfig;
pub mod worldtime;

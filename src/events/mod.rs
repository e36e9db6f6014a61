//! Message types exchanged across systems and threads.
//!
//! Submodules:
//! - [`audio`] – commands and messages for the background audio thread
pub mod audio;

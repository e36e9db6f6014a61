//! Background music sequencer.
//!
//! A [`BgmSequencer`] plays an optional intro clip once and then switches to
//! a looping "normal" clip on the same [`AudioSource`] sink. The sink is the
//! `AudioSource` component on the same entity; without one the sequencer
//! does nothing. The switch happens after the intro's length, but never
//! later than [`DEFAULT_INTRO_CAP`] seconds (see [`intro_wait`]). The length
//! is the one measured when the audio thread loads the clip; until then the
//! length declared in the scene, if any, is used.
//!
//! See [`crate::systems::bgmsequencer`] for the system that drives it.
//!
//! [`AudioSource`]: super::audiosource::AudioSource

use bevy_ecs::prelude::Component;

use super::audiosource::AudioClip;

/// Upper bound, in seconds, on how long the intro is allowed to play.
pub const DEFAULT_INTRO_CAP: f32 = 3.0;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SequencerPhase {
    /// Not started yet; the next tick activates it.
    Pending,
    /// Intro started at `started_at`; switch once [`intro_wait`] seconds passed.
    Intro { started_at: f32 },
    /// Normal clip requested (or nothing to play). Nothing left to do.
    Done,
}

#[derive(Component, Clone, Debug)]
pub struct BgmSequencer {
    pub intro: Option<AudioClip>,
    pub normal: Option<AudioClip>,
    /// Longest time the intro plays before the switch, in seconds.
    pub intro_cap: f32,
    pub phase: SequencerPhase,
}

impl BgmSequencer {
    pub fn new(intro: Option<AudioClip>, normal: Option<AudioClip>) -> Self {
        BgmSequencer {
            intro,
            normal,
            intro_cap: DEFAULT_INTRO_CAP,
            phase: SequencerPhase::Pending,
        }
    }
    pub fn with_intro_cap(mut self, cap: f32) -> Self {
        self.intro_cap = cap.max(0.0);
        self
    }

    /// World time at which the normal loop should start, once known.
    pub fn switch_time(&self) -> Option<f32> {
        match self.phase {
            SequencerPhase::Intro { started_at } => {
                intro_wait(self.intro.as_ref(), self.intro_cap).map(|wait| started_at + wait)
            }
            _ => None,
        }
    }
}

/// Seconds to wait between starting the intro and starting the normal loop.
///
/// `None` while the intro's length is still unknown.
pub fn intro_wait(intro: Option<&AudioClip>, cap: f32) -> Option<f32> {
    match intro {
        Some(clip) => clip.length.map(|length| length.min(cap)),
        None => Some(0.0),
    }
}

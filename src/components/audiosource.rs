//! Audio output sink attached to an entity.
//!
//! An [`AudioSource`] is the engine-side handle behaviours use to make
//! sound: they assign a clip, set the loop flag and call [`AudioSource::play`]
//! or [`AudioSource::stop`]. The sink does not own the clip; it only turns
//! these calls into [`AudioCmd`] messages for the audio thread and tracks
//! whether it believes something is playing.
//!
//! `play` and `stop` keep the playing flag themselves. The audio thread only
//! clears it, through
//! [`sync_audio_sources`](crate::systems::audio::sync_audio_sources), when a
//! non-looping clip runs out. Every play carries a generation number and the
//! thread echoes it back with the finished report, so a report about an
//! older play of the same clip is ignored.

use bevy_ecs::prelude::{Component, MessageWriter};
use log::warn;

use crate::events::audio::AudioCmd;

/// Measured and declared lengths further apart than this are reported.
const LENGTH_MISMATCH_TOLERANCE: f32 = 0.05;

/// Reference to a clip loaded on the audio thread.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioClip {
    /// Id the clip was loaded under.
    pub id: String,
    /// Length in seconds, `None` until the audio thread has measured it
    /// (or the scene declared it).
    pub length: Option<f32>,
}

impl AudioClip {
    pub fn new(id: impl Into<String>, length: f32) -> Self {
        AudioClip {
            id: id.into(),
            length: Some(length.max(0.0)),
        }
    }

    /// Clip whose length is only known once the audio thread loads it.
    pub fn unmeasured(id: impl Into<String>) -> Self {
        AudioClip {
            id: id.into(),
            length: None,
        }
    }

    /// Replace the length with the one measured on the audio thread.
    ///
    /// Returns `false` when `id` names another clip.
    pub fn apply_measured_length(&mut self, id: &str, measured: f32) -> bool {
        if self.id != id {
            return false;
        }
        let measured = measured.max(0.0);
        if let Some(declared) = self.length {
            if (declared - measured).abs() > LENGTH_MISMATCH_TOLERANCE {
                warn!(
                    "clip '{}' declared {:.2}s but measures {:.2}s, using the measured length",
                    self.id, declared, measured
                );
            }
        }
        self.length = Some(measured);
        true
    }
}

/// Which audio thread table the sink plays from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AudioChannel {
    /// Streamed music (`LoadMusic` / `PlayMusic`).
    Music,
    /// In-memory sound effect (`LoadFx` / `PlayFx`).
    Fx,
}

#[derive(Component, Clone, Debug)]
pub struct AudioSource {
    pub channel: AudioChannel,
    /// Clip that the next [`play`](AudioSource::play) will start.
    pub clip: Option<AudioClip>,
    pub looped: bool,
    /// Id of the clip that was last started and not stopped since.
    playing: Option<String>,
    /// Bumped on every play; echoed back by the audio thread.
    generation: u32,
}

impl AudioSource {
    pub fn new(channel: AudioChannel) -> Self {
        AudioSource {
            channel,
            clip: None,
            looped: false,
            playing: None,
            generation: 0,
        }
    }
    pub fn music() -> Self {
        Self::new(AudioChannel::Music)
    }
    pub fn fx() -> Self {
        Self::new(AudioChannel::Fx)
    }

    pub fn is_playing(&self) -> bool {
        self.playing.is_some()
    }

    /// Id of the clip currently playing, if any.
    pub fn playing_id(&self) -> Option<&str> {
        self.playing.as_deref()
    }

    /// Generation of the most recent play.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Start the assigned clip from the beginning.
    ///
    /// Whatever this sink was playing before is stopped first. Without an
    /// assigned clip this does nothing.
    pub fn play(&mut self, out: &mut MessageWriter<AudioCmd>) {
        let Some(clip) = self.clip.as_ref() else {
            return;
        };
        let id = clip.id.clone();
        if let Some(previous) = self.playing.take() {
            if previous != id {
                out.write(self.stop_cmd(previous));
            }
        }
        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;
        out.write(match self.channel {
            AudioChannel::Music => AudioCmd::PlayMusic {
                id: id.clone(),
                looped: self.looped,
                generation,
            },
            AudioChannel::Fx => AudioCmd::PlayFx {
                id: id.clone(),
                looped: self.looped,
                generation,
            },
        });
        self.playing = Some(id);
    }

    /// Stop whatever is playing. No-op when idle.
    pub fn stop(&mut self, out: &mut MessageWriter<AudioCmd>) {
        if let Some(id) = self.playing.take() {
            out.write(self.stop_cmd(id));
        }
    }

    /// Forget the playing clip without telling the audio thread.
    ///
    /// Used when the audio thread reports that play `generation` of `id`
    /// ran out on its own. Reports about older plays are ignored.
    pub fn mark_finished(&mut self, id: &str, generation: u32) {
        if self.playing.as_deref() == Some(id) && self.generation == generation {
            self.playing = None;
        }
    }

    fn stop_cmd(&self, id: String) -> AudioCmd {
        match self.channel {
            AudioChannel::Music => AudioCmd::StopMusic { id },
            AudioChannel::Fx => AudioCmd::StopFx { id },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_length_never_negative() {
        let clip = AudioClip::new("intro", -2.0);
        assert_eq!(clip.length, Some(0.0));
    }

    #[test]
    fn test_measured_length_replaces_declared() {
        let mut clip = AudioClip::new("intro", 2.0);
        assert!(!clip.apply_measured_length("theme", 9.0));
        assert_eq!(clip.length, Some(2.0));
        assert!(clip.apply_measured_length("intro", 1.4));
        assert_eq!(clip.length, Some(1.4));

        let mut unknown = AudioClip::unmeasured("steps");
        assert!(unknown.apply_measured_length("steps", 0.6));
        assert_eq!(unknown.length, Some(0.6));
    }

    #[test]
    fn test_new_source_is_idle() {
        let source = AudioSource::music();
        assert!(!source.is_playing());
        assert!(source.clip.is_none());
        assert!(!source.looped);
        assert_eq!(source.channel, AudioChannel::Music);
        assert_eq!(source.generation(), 0);
    }

    #[test]
    fn test_mark_finished_ignores_other_ids() {
        let mut source = AudioSource::fx();
        source.playing = Some("steps".into());
        source.generation = 1;
        source.mark_finished("theme", 1);
        assert_eq!(source.playing_id(), Some("steps"));
        source.mark_finished("steps", 1);
        assert!(!source.is_playing());
    }

    #[test]
    fn test_mark_finished_ignores_older_plays() {
        let mut source = AudioSource::fx();
        source.playing = Some("steps".into());
        source.generation = 3;
        source.mark_finished("steps", 2);
        assert_eq!(source.playing_id(), Some("steps"));
        source.mark_finished("steps", 3);
        assert!(!source.is_playing());
    }
}

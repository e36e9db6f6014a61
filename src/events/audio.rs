//! Audio messages exchanged between the ECS world and the audio thread.
//!
//! Systems never touch the audio device. They write [`AudioCmd`] messages
//! (usually through [`AudioSource`](crate::components::audiosource::AudioSource)),
//! which [`forward_audio_cmds`](crate::systems::audio::forward_audio_cmds)
//! pushes to the audio thread. The thread answers with [`AudioMessage`]s.

use bevy_ecs::message::Message;

/// Commands sent *to* the audio thread
#[derive(Message, Debug, Clone, PartialEq)]
pub enum AudioCmd {
    LoadMusic { id: String, path: String },
    UnloadMusic { id: String },
    UnloadAllMusic,
    PlayMusic { id: String, looped: bool, generation: u32 },
    StopMusic { id: String },
    LoadFx { id: String, path: String },
    UnloadFx { id: String },
    UnloadAllFx,
    PlayFx { id: String, looped: bool, generation: u32 },
    StopFx { id: String },
    Shutdown,
}

/// Events sent *back* from the audio thread
#[derive(Message, Debug, Clone, PartialEq)]
pub enum AudioMessage {
    /// `length` is the measured clip length in seconds.
    MusicLoaded { id: String, length: f32 },
    MusicUnloaded { id: String },
    MusicUnloadedAll,
    MusicLoadFailed { id: String, error: String },
    MusicPlayStarted { id: String },
    /// Reply to `StopMusic`; informational only.
    MusicStopped { id: String },
    /// A non-looping play reached its end. `generation` is the one the
    /// play command carried.
    MusicFinished { id: String, generation: u32 },
    FxLoaded { id: String, length: f32 },
    FxUnloaded { id: String },
    FxUnloadedAll,
    FxLoadFailed { id: String, error: String },
    FxStopped { id: String },
    FxFinished { id: String, generation: u32 },
}

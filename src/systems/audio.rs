//! Audio thread and the systems that connect it to the ECS world.
//!
//! - [`audio_thread`] owns the raylib audio device and every loaded
//!   `Music`/`Sound`, executing [`AudioCmd`]s and reporting [`AudioMessage`]s.
//! - [`update_bevy_audio_cmds`] + [`forward_audio_cmds`] move commands
//!   written by sinks this frame onto the channel.
//! - [`poll_audio_messages`] + [`update_bevy_audio_messages`] bring the
//!   thread's replies back into the ECS.
//! - [`sync_audio_sources`] clears the playing flag of sinks whose clip
//!   finished on its own.
//! - [`apply_clip_lengths`] copies the lengths measured at load time onto
//!   the clips that sequencers, followers and sinks refer to.
//!
//! Raylib audio calls stay on one thread; the game thread only talks to it
//! through crossbeam channels. Set up with
//! [`crate::resources::audio::setup_audio`].

use crate::components::audiosource::{AudioChannel, AudioClip, AudioSource};
use crate::components::bgmsequencer::BgmSequencer;
use crate::components::pathfollower::PathFollower;
use crate::events::audio::{AudioCmd, AudioMessage};
use crate::resources::audio::AudioBridge;
use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender};
use log::{debug, error, info, warn};
use raylib::core::audio::{Music, RaylibAudio, Sound};
use rustc_hash::{FxHashMap, FxHashSet};

/// Drain pending replies from the audio thread into `Messages<AudioMessage>`.
pub fn poll_audio_messages(bridge: Res<AudioBridge>, mut writer: MessageWriter<AudioMessage>) {
    writer.write_batch(bridge.rx_msg.try_iter());
}

/// Advance the [`AudioMessage`] queue. Run after [`poll_audio_messages`].
pub fn update_bevy_audio_messages(mut msgs: ResMut<Messages<AudioMessage>>) {
    msgs.update();
}

/// Forward ECS AudioCmd messages to the audio thread via the AudioBridge sender.
pub fn forward_audio_cmds(bridge: Res<AudioBridge>, mut reader: MessageReader<AudioCmd>) {
    for cmd in reader.read() {
        bridge.send(cmd.clone());
    }
}

/// Advance the ECS message queue for AudioCmd so same-frame readers can observe writes.
pub fn update_bevy_audio_cmds(mut msgs: ResMut<Messages<AudioCmd>>) {
    msgs.update();
}

/// Mark sinks idle when the audio thread says their clip ran out.
///
/// Only finished reports matter: `play` and `stop` already keep the flag,
/// and a `*Stopped` reply may arrive after the sink started playing again.
pub fn sync_audio_sources(
    mut reader: MessageReader<AudioMessage>,
    mut sources: Query<&mut AudioSource>,
) {
    for msg in reader.read() {
        let (channel, id, generation) = match msg {
            AudioMessage::MusicFinished { id, generation } => (AudioChannel::Music, id, *generation),
            AudioMessage::FxFinished { id, generation } => (AudioChannel::Fx, id, *generation),
            _ => continue,
        };
        for mut source in sources.iter_mut() {
            if source.channel == channel && source.playing_id() == Some(id.as_str()) {
                source.mark_finished(id, generation);
            }
        }
    }
}

/// Update clip lengths from the audio thread's load reports.
///
/// A clip that failed to load and has no declared length gets length 0, so
/// nothing waits on it forever.
pub fn apply_clip_lengths(
    mut reader: MessageReader<AudioMessage>,
    mut sequencers: Query<&mut BgmSequencer>,
    mut followers: Query<&mut PathFollower>,
    mut sources: Query<&mut AudioSource>,
) {
    for msg in reader.read() {
        let (id, measured) = match msg {
            AudioMessage::MusicLoaded { id, length } | AudioMessage::FxLoaded { id, length } => {
                (id.as_str(), Some(*length))
            }
            AudioMessage::MusicLoadFailed { id, .. } | AudioMessage::FxLoadFailed { id, .. } => {
                (id.as_str(), None)
            }
            _ => continue,
        };
        let update = |clip: &mut AudioClip| match measured {
            Some(length) => {
                clip.apply_measured_length(id, length);
            }
            None => {
                if clip.id == id && clip.length.is_none() {
                    clip.length = Some(0.0);
                }
            }
        };

        for mut seq in sequencers.iter_mut() {
            let seq = &mut *seq;
            seq.intro.iter_mut().chain(seq.normal.iter_mut()).for_each(update);
        }
        for mut follower in followers.iter_mut() {
            follower.move_clip.iter_mut().for_each(update);
        }
        for mut source in sources.iter_mut() {
            source.clip.iter_mut().for_each(update);
        }
    }
}

/// Apply a play request's loop flag to a music stream.
///
/// raylib loads every stream with looping on; left that way a one-shot
/// never stops playing and its finished report never comes.
fn configure_stream(stream: &mut raylib::ffi::Music, looped: bool) {
    stream.looping = looped;
}

/// Length in seconds of a loaded sound effect.
fn sound_length(sound: &Sound) -> f32 {
    let rate = sound.stream.sampleRate.max(1) as f32;
    sound.frameCount as f32 / rate
}

/// Entry point of the dedicated audio thread.
///
/// Initializes the raylib audio device, then loops: drain commands, pump
/// music streams, restart looped effects that ran out, report the plays
/// that finished. Looped music wraps inside raylib itself. Returns after [`AudioCmd::Shutdown`], once
/// every handle is dropped.
pub fn audio_thread(rx_cmd: Receiver<AudioCmd>, tx_evt: Sender<AudioMessage>) {
    let audio = match RaylibAudio::init_audio_device() {
        Ok(device) => device,
        Err(e) => {
            error!("[audio] failed to initialize audio device: {}", e);
            // keep draining so senders never block on a dead thread
            for cmd in rx_cmd.iter() {
                if matches!(cmd, AudioCmd::Shutdown) {
                    break;
                }
            }
            return;
        }
    };

    info!(
        "[audio] thread starting (id={:?})",
        std::thread::current().id()
    );

    let mut musics: FxHashMap<String, Music> = FxHashMap::default();
    // id -> generation of the play in progress
    let mut playing: FxHashMap<String, u32> = FxHashMap::default();
    let mut sounds: FxHashMap<String, Sound> = FxHashMap::default();
    let mut fx_playing: FxHashMap<String, u32> = FxHashMap::default();
    let mut fx_looped: FxHashSet<String> = FxHashSet::default();

    'run: loop {
        for cmd in rx_cmd.try_iter() {
            match cmd {
                AudioCmd::LoadMusic { id, path } => match audio.new_music(&path) {
                    Ok(music) => {
                        let length = music.get_time_length();
                        info!(
                            "[audio] loaded id='{}' path='{}' length={:.2}s",
                            id, path, length
                        );
                        musics.insert(id.clone(), music);
                        let _ = tx_evt.send(AudioMessage::MusicLoaded { id, length });
                    }
                    Err(e) => {
                        warn!(
                            "[audio] load failed id='{}' path='{}' error='{}'",
                            id, path, e
                        );
                        let _ = tx_evt.send(AudioMessage::MusicLoadFailed {
                            id,
                            error: e.to_string(),
                        });
                    }
                },
                AudioCmd::PlayMusic {
                    id,
                    looped: want_loop,
                    generation,
                } => {
                    if let Some(music) = musics.get_mut(&id) {
                        debug!("[audio] play start id='{}' looped={}", id, want_loop);
                        configure_stream(music, want_loop);
                        music.seek_stream(0.0);
                        music.play_stream();
                        playing.insert(id.clone(), generation);
                        let _ = tx_evt.send(AudioMessage::MusicPlayStarted { id });
                    } else {
                        warn!("[audio] play failed id='{}' reason='not loaded'", id);
                    }
                }
                AudioCmd::StopMusic { id } => {
                    if let Some(music) = musics.get(&id) {
                        debug!("[audio] stop id='{}'", id);
                        music.stop_stream();
                        playing.remove(&id);
                        let _ = tx_evt.send(AudioMessage::MusicStopped { id });
                    }
                }
                AudioCmd::UnloadMusic { id } => {
                    if musics.remove(&id).is_some() {
                        debug!("[audio] unload id='{}'", id);
                        playing.remove(&id);
                        let _ = tx_evt.send(AudioMessage::MusicUnloaded { id });
                    }
                }
                AudioCmd::UnloadAllMusic => {
                    debug!("[audio] unload all");
                    musics.clear();
                    playing.clear();
                    let _ = tx_evt.send(AudioMessage::MusicUnloadedAll);
                }
                AudioCmd::LoadFx { id, path } => match audio.new_sound(&path) {
                    Ok(sound) => {
                        let length = sound_length(&sound);
                        info!(
                            "[audio] fx loaded id='{}' path='{}' length={:.2}s",
                            id, path, length
                        );
                        sounds.insert(id.clone(), sound);
                        let _ = tx_evt.send(AudioMessage::FxLoaded { id, length });
                    }
                    Err(e) => {
                        warn!(
                            "[audio] fx load failed id='{}' path='{}' error='{}'",
                            id, path, e
                        );
                        let _ = tx_evt.send(AudioMessage::FxLoadFailed {
                            id,
                            error: e.to_string(),
                        });
                    }
                },
                AudioCmd::PlayFx {
                    id,
                    looped: want_loop,
                    generation,
                } => {
                    if let Some(sound) = sounds.get(&id) {
                        debug!("[audio] fx play id='{}' looped={}", id, want_loop);
                        sound.play();
                        fx_playing.insert(id.clone(), generation);
                        if want_loop {
                            fx_looped.insert(id);
                        } else {
                            fx_looped.remove(&id);
                        }
                    } else {
                        warn!("[audio] fx play failed id='{}' reason='not loaded'", id);
                    }
                }
                AudioCmd::StopFx { id } => {
                    if let Some(sound) = sounds.get(&id) {
                        debug!("[audio] fx stop id='{}'", id);
                        sound.stop();
                        fx_playing.remove(&id);
                        fx_looped.remove(&id);
                        let _ = tx_evt.send(AudioMessage::FxStopped { id });
                    }
                }
                AudioCmd::UnloadFx { id } => {
                    if sounds.remove(&id).is_some() {
                        debug!("[audio] fx unload id='{}'", id);
                        fx_playing.remove(&id);
                        fx_looped.remove(&id);
                        let _ = tx_evt.send(AudioMessage::FxUnloaded { id });
                    }
                }
                AudioCmd::UnloadAllFx => {
                    debug!("[audio] fx unload all");
                    sounds.clear();
                    fx_playing.clear();
                    fx_looped.clear();
                    let _ = tx_evt.send(AudioMessage::FxUnloadedAll);
                }
                AudioCmd::Shutdown => {
                    info!("[audio] shutdown requested");
                    musics.clear();
                    playing.clear();
                    let _ = tx_evt.send(AudioMessage::MusicUnloadedAll);
                    sounds.clear();
                    fx_playing.clear();
                    fx_looped.clear();
                    let _ = tx_evt.send(AudioMessage::FxUnloadedAll);
                    break 'run;
                }
            }
        }

        // `update_stream()` must be called regularly while playing.
        let mut ended: Vec<(String, u32)> = Vec::new();
        for (id, generation) in playing.iter() {
            if let Some(music) = musics.get(id) {
                if music.is_stream_playing() {
                    music.update_stream();
                } else {
                    ended.push((id.clone(), *generation));
                }
            }
        }
        for (id, generation) in ended {
            debug!("[audio] finished id='{}'", id);
            playing.remove(&id);
            let _ = tx_evt.send(AudioMessage::MusicFinished { id, generation });
        }

        let fx_ended: Vec<(String, u32)> = fx_playing
            .iter()
            .filter(|(id, _)| !sounds.get(*id).map(|s| s.is_playing()).unwrap_or(false))
            .map(|(id, generation)| (id.clone(), *generation))
            .collect();
        for (id, generation) in fx_ended {
            match sounds.get(&id) {
                Some(sound) if fx_looped.contains(&id) => sound.play(),
                _ => {
                    debug!("[audio] fx finished id='{}'", id);
                    fx_playing.remove(&id);
                    fx_looped.remove(&id);
                    let _ = tx_evt.send(AudioMessage::FxFinished { id, generation });
                }
            }
        }
        std::thread::sleep(std::time::Duration::from_millis(10));
    } // 'run

    info!(
        "[audio] thread exiting (id={:?})",
        std::thread::current().id()
    );

    // musics and sounds drop before `audio`
    drop(musics);
    drop(sounds);
}

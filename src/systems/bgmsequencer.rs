//! Background music sequencing.
//!
//! [`bgm_sequencer_system`] walks each [`BgmSequencer`] through its phases:
//!
//! 1. `Pending`: with an intro clip *and* a sink, play the intro once;
//!    otherwise start the normal loop right away.
//! 2. `Intro`: once `intro_wait` seconds have passed since the intro
//!    started, start the normal loop. The wait is read every tick, so a
//!    length measured after the intro started still moves the switch.
//! 3. `Done`: nothing left to do.
//!
//! A missing normal clip or sink turns "start the normal loop" into a no-op.

use bevy_ecs::prelude::*;
use log::debug;

use crate::components::audiosource::AudioSource;
use crate::components::bgmsequencer::{BgmSequencer, SequencerPhase};
use crate::events::audio::AudioCmd;
use crate::resources::worldtime::WorldTime;

pub fn bgm_sequencer_system(
    time: Res<WorldTime>,
    mut query: Query<(Entity, &mut BgmSequencer, Option<&mut AudioSource>)>,
    mut audio: MessageWriter<AudioCmd>,
) {
    let now = time.elapsed;
    for (entity, mut seq, mut sink) in query.iter_mut() {
        let phase = seq.phase;
        match phase {
            SequencerPhase::Pending => match (seq.intro.clone(), sink.as_deref_mut()) {
                (Some(intro), Some(sink)) => {
                    debug!(
                        "bgm {:?}: intro '{}' (length {:?}, cap {:.2}s)",
                        entity, intro.id, intro.length, seq.intro_cap
                    );
                    sink.looped = false;
                    sink.clip = Some(intro);
                    sink.play(&mut audio);
                    seq.phase = SequencerPhase::Intro { started_at: now };
                }
                (_, sink) => {
                    play_normal_loop(&seq, sink, &mut audio);
                    seq.phase = SequencerPhase::Done;
                }
            },
            SequencerPhase::Intro { .. } => {
                if seq.switch_time().is_some_and(|switch_at| now >= switch_at) {
                    debug!("bgm {:?}: switching to normal loop", entity);
                    play_normal_loop(&seq, sink.as_deref_mut(), &mut audio);
                    seq.phase = SequencerPhase::Done;
                }
            }
            SequencerPhase::Done => {}
        }
    }
}

fn play_normal_loop(
    seq: &BgmSequencer,
    sink: Option<&mut AudioSource>,
    audio: &mut MessageWriter<AudioCmd>,
) {
    let (Some(normal), Some(sink)) = (seq.normal.as_ref(), sink) else {
        return;
    };
    sink.clip = Some(normal.clone());
    sink.looped = true;
    sink.play(audio);
}

//! Bridge between the ECS world and the audio thread.
//!
//! [`setup_audio`] spawns the thread and registers the resources that
//! sinks and the forwarding systems use; [`shutdown_audio`] stops and joins
//! it. Between the two, nothing but the audio thread touches the device.

use crate::events::audio::{AudioCmd, AudioMessage};
use crate::systems::audio::audio_thread;
use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{info, warn};

/// Channels to and from the audio thread, plus its join handle.
#[derive(Resource)]
pub struct AudioBridge {
    /// ECS -> audio thread.
    pub tx_cmd: Sender<AudioCmd>,
    /// Audio thread -> ECS.
    pub rx_msg: Receiver<AudioMessage>,
    pub handle: std::thread::JoinHandle<()>,
}

impl AudioBridge {
    /// Send a command, logging instead of failing if the thread is gone.
    pub fn send(&self, cmd: AudioCmd) {
        if let Err(e) = self.tx_cmd.send(cmd) {
            warn!("audio thread unreachable, dropped {:?}", e.into_inner());
        }
    }
}

/// Spawn the audio thread and register bridge resources.
///
/// Inserts [`AudioBridge`] together with `Messages<AudioCmd>` and
/// `Messages<AudioMessage>`. Must run before anything writes audio commands.
pub fn setup_audio(world: &mut World) {
    let (tx_cmd, rx_cmd) = unbounded::<AudioCmd>();
    let (tx_msg, rx_msg) = unbounded::<AudioMessage>();

    let handle = std::thread::spawn(move || audio_thread(rx_cmd, tx_msg));

    world.insert_resource(AudioBridge {
        tx_cmd,
        rx_msg,
        handle,
    });
    world.init_resource::<Messages<AudioCmd>>();
    world.init_resource::<Messages<AudioMessage>>();
}

/// Ask the audio thread to unload everything and exit, then join it.
pub fn shutdown_audio(world: &mut World) {
    if let Some(bridge) = world.remove_resource::<AudioBridge>() {
        bridge.send(AudioCmd::Shutdown);
        if bridge.handle.join().is_err() {
            warn!("audio thread panicked before shutdown");
        } else {
            info!("audio thread joined");
        }
    }
}

//! Wayfarer demo entry point.
//!
//! Loads `config.ini` and a scene file, opens a raylib window and runs the
//! frame loop:
//!
//! 1. Advance [`WorldTime`] by the frame delta.
//! 2. Exchange audio commands/messages with the audio thread.
//! 3. Handle shortcuts, advance path followers and the music sequencer.
//! 4. Render followers (plus path gizmos in debug mode).
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --scene ./assets/scenes/demo.json --debug
//! ```

use bevy_ecs::prelude::*;
use clap::Parser;
use std::path::PathBuf;

use wayfarer::game::{self, SceneData};
use wayfarer::resources::audio::{setup_audio, shutdown_audio};
use wayfarer::resources::debugmode::DebugMode;
use wayfarer::resources::gameconfig::GameConfig;
use wayfarer::resources::worldtime::WorldTime;
use wayfarer::systems::audio::{
    apply_clip_lengths, forward_audio_cmds, poll_audio_messages, sync_audio_sources,
    update_bevy_audio_cmds, update_bevy_audio_messages,
};
use wayfarer::systems::bgmsequencer::bgm_sequencer_system;
use wayfarer::systems::input::{debug_toggle_system, follower_toggle_system};
use wayfarer::systems::pathfollower::{path_follower_awake_system, path_follower_system};
use wayfarer::systems::render::render_system;
use wayfarer::systems::time::update_world_time;

/// Intro-then-loop background music and waypoint path following.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// Scene file to load instead of the one named in the configuration.
    #[arg(long, value_name = "PATH")]
    scene: Option<PathBuf>,

    /// Start with the debug overlay (and path gizmos) on.
    #[arg(long)]
    debug: bool,

    /// Write the effective configuration to the config file and exit.
    #[arg(long)]
    save_config: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = GameConfig::with_path(&cli.config);
    if let Err(e) = config.load_from_file() {
        log::warn!("{}; using defaults", e);
    }
    if let Some(scene) = cli.scene {
        config.scene_path = scene;
    }
    if cli.debug {
        config.debug = true;
    }

    if cli.save_config {
        if let Err(e) = config.save_to_file() {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
        return;
    }

    let scene = match SceneData::load_from_file(&config.scene_path) {
        Ok(scene) => scene,
        Err(e) => {
            eprintln!(
                "Error loading scene {}: {e}",
                config.scene_path.display()
            );
            std::process::exit(1);
        }
    };

    // --------------- Raylib window ---------------
    let mut builder = raylib::init();
    builder
        .size(config.window_width as i32, config.window_height as i32)
        .resizable()
        .title("Wayfarer");
    if config.vsync {
        builder.vsync();
    }
    let (mut rl, thread) = builder.build();
    rl.set_target_fps(config.target_fps);
    rl.set_exit_key(None);

    // --------------- ECS world + resources ---------------
    let mut world = World::new();
    world.insert_resource(WorldTime::default());
    if config.debug {
        world.insert_resource(DebugMode {});
    }
    world.insert_resource(config);

    // must go before the scene setup, it registers the audio message queues
    setup_audio(&mut world);
    game::setup(&mut world, &scene);

    world.insert_non_send_resource(rl);
    world.insert_non_send_resource(thread);
    world.flush();

    let mut update = Schedule::default();
    update.add_systems(
        // audio systems must be together
        (
            update_bevy_audio_cmds,
            forward_audio_cmds,
            poll_audio_messages,
            update_bevy_audio_messages,
            sync_audio_sources,
            apply_clip_lengths,
        )
            .chain(),
    );
    update.add_systems(debug_toggle_system);
    update.add_systems(follower_toggle_system);
    update.add_systems(path_follower_awake_system);
    update.add_systems(
        path_follower_system
            .after(path_follower_awake_system)
            .after(follower_toggle_system)
            .after(apply_clip_lengths),
    );
    update.add_systems(bgm_sequencer_system.after(apply_clip_lengths));
    update.add_systems(
        render_system
            .after(path_follower_system)
            .after(bgm_sequencer_system)
            .after(debug_toggle_system),
    );

    update
        .initialize(&mut world)
        .expect("Failed to initialize schedule");

    // --------------- Main loop ---------------
    while !world
        .non_send_resource::<raylib::RaylibHandle>()
        .window_should_close()
    {
        let dt = world
            .non_send_resource::<raylib::RaylibHandle>()
            .get_frame_time();
        update_world_time(&mut world, dt);

        update.run(&mut world);

        world.clear_trackers();
    }
    shutdown_audio(&mut world);
}

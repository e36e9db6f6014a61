//! Scene description and setup.
//!
//! A scene file lists the audio clips to load, an optional music sequencer
//! and any number of path followers. [`setup`] asks the audio thread to load
//! the clips and spawns one entity per behaviour.
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "clips": [
//!     { "id": "intro", "path": "./assets/audio/intro.ogg", "length": 2.4, "kind": "music" },
//!     { "id": "theme", "path": "./assets/audio/theme.ogg", "length": 64.0, "kind": "music" },
//!     { "id": "steps", "path": "./assets/audio/steps.wav", "kind": "fx" }
//!   ],
//!   "music": { "intro": "intro", "normal": "theme" },
//!   "followers": [
//!     {
//!       "waypoints": [[-3.0, 2.0, 0.0], [3.0, 2.0, 0.0], [3.0, -2.0, 0.0], [-3.0, -2.0, 0.0]],
//!       "speed": 3.0,
//!       "loop": true,
//!       "move_clip": "steps"
//!     }
//!   ]
//! }
//! ```
//!
//! Clip references that don't match a declared clip are logged and treated
//! as "no clip". `length` is optional: the audio thread measures every clip
//! it loads and that measurement wins. A declared length only covers the
//! frames before the load report arrives; a mismatch is logged.

use bevy_ecs::prelude::*;
use log::{info, warn};
use raylib::prelude::Vector3;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::components::animator::Animator;
use crate::components::audiosource::{AudioClip, AudioSource};
use crate::components::bgmsequencer::{BgmSequencer, DEFAULT_INTRO_CAP};
use crate::components::mapposition::MapPosition;
use crate::components::pathfollower::PathFollower;
use crate::events::audio::AudioCmd;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClipKind {
    #[default]
    Music,
    Fx,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipDef {
    pub id: String,
    pub path: String,
    /// Expected length in seconds.
    #[serde(default)]
    pub length: Option<f32>,
    #[serde(default)]
    pub kind: ClipKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicDef {
    #[serde(default)]
    pub intro: Option<String>,
    #[serde(default)]
    pub normal: Option<String>,
    #[serde(default = "default_intro_cap")]
    pub intro_cap: f32,
    /// Without a sink the sequencer stays silent.
    #[serde(default = "default_true")]
    pub sink: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowerDef {
    pub waypoints: Vec<[f32; 3]>,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_true", rename = "loop")]
    pub looped: bool,
    #[serde(default)]
    pub move_clip: Option<String>,
    #[serde(default = "default_true")]
    pub loop_move_sfx: bool,
    #[serde(default = "default_true")]
    pub lock_z: bool,
    #[serde(default)]
    pub z_lock_value: f32,
    #[serde(default = "default_true")]
    pub draw_gizmos: bool,
    #[serde(default = "default_true")]
    pub animator: bool,
    /// Start position; defaults to the first waypoint.
    #[serde(default)]
    pub start: Option<[f32; 3]>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneData {
    #[serde(default)]
    pub clips: Vec<ClipDef>,
    #[serde(default)]
    pub music: Option<MusicDef>,
    #[serde(default)]
    pub followers: Vec<FollowerDef>,
}

fn default_true() -> bool {
    true
}
fn default_speed() -> f32 {
    3.0
}
fn default_intro_cap() -> f32 {
    DEFAULT_INTRO_CAP
}

fn v3(a: [f32; 3]) -> Vector3 {
    Vector3 {
        x: a[0],
        y: a[1],
        z: a[2],
    }
}

impl SceneData {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let file_content = std::fs::read_to_string(path)?;
        Self::from_json(&file_content)
    }

    pub fn from_json(text: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let scene: SceneData = serde_json::from_str(text)?;
        Ok(scene)
    }

    /// Look up a declared clip by id.
    pub fn clip(&self, id: &str) -> Option<AudioClip> {
        self.clips
            .iter()
            .find(|c| c.id == id)
            .map(|c| match c.length {
                Some(length) => AudioClip::new(c.id.clone(), length),
                None => AudioClip::unmeasured(c.id.clone()),
            })
    }

    fn resolve(&self, id: Option<&String>, what: &str) -> Option<AudioClip> {
        let id = id?;
        let clip = self.clip(id);
        if clip.is_none() {
            warn!("scene: {} clip '{}' is not declared, ignoring", what, id);
        }
        clip
    }

    /// Commands that load every declared clip on the audio thread.
    pub fn load_commands(&self) -> Vec<AudioCmd> {
        self.clips
            .iter()
            .map(|c| match c.kind {
                ClipKind::Music => AudioCmd::LoadMusic {
                    id: c.id.clone(),
                    path: c.path.clone(),
                },
                ClipKind::Fx => AudioCmd::LoadFx {
                    id: c.id.clone(),
                    path: c.path.clone(),
                },
            })
            .collect()
    }

    pub fn sequencer(&self) -> Option<(BgmSequencer, Option<AudioSource>)> {
        let music = self.music.as_ref()?;
        let seq = BgmSequencer::new(
            self.resolve(music.intro.as_ref(), "intro"),
            self.resolve(music.normal.as_ref(), "normal"),
        )
        .with_intro_cap(music.intro_cap);
        let sink = music.sink.then(AudioSource::music);
        Some((seq, sink))
    }

    pub fn follower(&self, def: &FollowerDef) -> PathFollower {
        let mut follower = PathFollower::new(def.waypoints.iter().copied().map(v3).collect())
            .with_speed(def.speed)
            .with_loop(def.looped)
            .with_loop_move_sfx(def.loop_move_sfx)
            .with_gizmos(def.draw_gizmos);
        follower = if def.lock_z {
            follower.with_z_lock(def.z_lock_value)
        } else {
            PathFollower {
                z_lock_value: def.z_lock_value,
                ..follower.without_z_lock()
            }
        };
        if let Some(clip) = self.resolve(def.move_clip.as_ref(), "move") {
            follower = follower.with_move_clip(clip);
        }
        follower
    }
}

/// Load the scene's clips and spawn its entities.
pub fn setup(world: &mut World, scene: &SceneData) {
    {
        let mut cmds = world.resource_mut::<Messages<AudioCmd>>();
        for cmd in scene.load_commands() {
            cmds.write(cmd);
        }
    }

    if let Some((seq, sink)) = scene.sequencer() {
        let mut entity = world.spawn(seq);
        if let Some(sink) = sink {
            entity.insert(sink);
        }
        info!("scene: spawned music sequencer {:?}", entity.id());
    }

    for def in &scene.followers {
        let follower = scene.follower(def);
        let start = def
            .start
            .map(v3)
            .or_else(|| follower.waypoints.first().copied())
            .unwrap_or(Vector3 {
                x: 0.0,
                y: 0.0,
                z: 0.0,
            });
        let has_sfx = follower.move_clip.is_some();
        let mut entity = world.spawn((
            follower,
            MapPosition::new(start.x, start.y, start.z),
        ));
        if def.animator {
            entity.insert(Animator::default());
        }
        if has_sfx {
            entity.insert(AudioSource::fx());
        }
        info!(
            "scene: spawned path follower {:?} ({} waypoints)",
            entity.id(),
            def.waypoints.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"{
        "clips": [
            { "id": "intro", "path": "a.ogg", "length": 5.0 },
            { "id": "theme", "path": "b.ogg", "length": 40.0, "kind": "music" },
            { "id": "steps", "path": "c.wav", "kind": "fx" }
        ],
        "music": { "intro": "intro", "normal": "theme" },
        "followers": [
            { "waypoints": [[0, 0, 3], [2, 0, 3]], "move_clip": "steps", "z_lock_value": 1.5 },
            { "waypoints": [[0, 0, 0]], "loop": false, "lock_z": false, "move_clip": "missing" }
        ]
    }"#;

    #[test]
    fn test_parse_applies_defaults() {
        let scene = SceneData::from_json(SCENE).unwrap();
        assert_eq!(scene.clips.len(), 3);
        assert_eq!(scene.clips[0].kind, ClipKind::Music);
        assert_eq!(scene.clips[2].kind, ClipKind::Fx);
        let music = scene.music.as_ref().unwrap();
        assert_eq!(music.intro_cap, DEFAULT_INTRO_CAP);
        assert!(music.sink);
        let f = &scene.followers[0];
        assert_eq!(f.speed, 3.0);
        assert!(f.looped && f.lock_z && f.animator && f.draw_gizmos && f.loop_move_sfx);
    }

    #[test]
    fn test_undeclared_length_waits_for_measurement() {
        let scene = SceneData::from_json(SCENE).unwrap();
        assert_eq!(scene.clip("steps"), Some(AudioClip::unmeasured("steps")));
        assert_eq!(scene.clip("theme").unwrap().length, Some(40.0));
        assert_eq!(scene.clip("nope"), None);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(SceneData::from_json("{ not json").is_err());
    }

    #[test]
    fn test_load_commands_match_clip_kinds() {
        let scene = SceneData::from_json(SCENE).unwrap();
        let cmds = scene.load_commands();
        assert_eq!(
            cmds[0],
            AudioCmd::LoadMusic {
                id: "intro".into(),
                path: "a.ogg".into()
            }
        );
        assert_eq!(
            cmds[2],
            AudioCmd::LoadFx {
                id: "steps".into(),
                path: "c.wav".into()
            }
        );
    }

    #[test]
    fn test_sequencer_resolves_clips() {
        let scene = SceneData::from_json(SCENE).unwrap();
        let (seq, sink) = scene.sequencer().unwrap();
        assert_eq!(seq.intro, Some(AudioClip::new("intro", 5.0)));
        assert_eq!(seq.normal, Some(AudioClip::new("theme", 40.0)));
        assert!(sink.is_some());
    }

    #[test]
    fn test_follower_unknown_clip_is_dropped() {
        let scene = SceneData::from_json(SCENE).unwrap();
        let follower = scene.follower(&scene.followers[1]);
        assert!(follower.move_clip.is_none());
        assert!(!follower.looped);
        assert!(!follower.lock_z);
        assert!(!follower.can_move());
    }

    #[test]
    fn test_setup_spawns_entities_and_queues_loads() {
        let scene = SceneData::from_json(SCENE).unwrap();
        let mut world = World::new();
        world.init_resource::<Messages<AudioCmd>>();

        setup(&mut world, &scene);

        let loads: Vec<AudioCmd> = world
            .resource_mut::<Messages<AudioCmd>>()
            .drain()
            .collect();
        assert_eq!(loads.len(), 3);

        let mut followers = world.query::<(&PathFollower, &MapPosition, Option<&AudioSource>)>();
        assert_eq!(followers.iter(&world).count(), 2);
        let with_sfx = followers
            .iter(&world)
            .filter(|(_, _, sink)| sink.is_some())
            .count();
        assert_eq!(with_sfx, 1);

        let mut sequencers = world.query::<(&BgmSequencer, &AudioSource)>();
        assert_eq!(sequencers.iter(&world).count(), 1);
    }

    #[test]
    fn test_setup_starts_at_first_waypoint() {
        let scene = SceneData::from_json(SCENE).unwrap();
        let mut world = World::new();
        world.init_resource::<Messages<AudioCmd>>();
        setup(&mut world, &scene);

        let mut q = world.query::<(&PathFollower, &MapPosition)>();
        let (follower, pos) = q
            .iter(&world)
            .find(|(f, _)| f.move_clip.is_some())
            .unwrap();
        assert_eq!(follower.z_lock_value, 1.5);
        assert_eq!(pos.pos.x, 0.0);
        assert_eq!(pos.pos.z, 3.0); // locked by the awake system, not by setup
    }
}

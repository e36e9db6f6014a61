//! Game configuration resource.
//!
//! Settings come from an INI file. Every value has a safe default, so a
//! missing file or key only means "use the default".
//!
//! # Configuration File Format
//!
//! ```ini
//! [window]
//! width = 1280
//! height = 720
//! target_fps = 60
//! vsync = true
//!
//! [render]
//! pixels_per_unit = 64
//!
//! [scene]
//! path = ./assets/scenes/demo.json
//!
//! [debug]
//! enabled = false
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

/// Default safe values for startup
const DEFAULT_WINDOW_WIDTH: u32 = 1280;
const DEFAULT_WINDOW_HEIGHT: u32 = 720;
const DEFAULT_TARGET_FPS: u32 = 60;
const DEFAULT_VSYNC: bool = true;
const DEFAULT_PIXELS_PER_UNIT: f32 = 64.0;
const DEFAULT_SCENE_PATH: &str = "./assets/scenes/demo.json";
const DEFAULT_DEBUG: bool = false;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

#[derive(Resource, Debug, Clone)]
pub struct GameConfig {
    pub window_width: u32,
    pub window_height: u32,
    pub target_fps: u32,
    pub vsync: bool,
    /// Screen pixels per world unit.
    pub pixels_per_unit: f32,
    /// Scene file loaded at startup.
    pub scene_path: PathBuf,
    /// Start with the debug overlay on.
    pub debug: bool,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GameConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            target_fps: DEFAULT_TARGET_FPS,
            vsync: DEFAULT_VSYNC,
            pixels_per_unit: DEFAULT_PIXELS_PER_UNIT,
            scene_path: PathBuf::from(DEFAULT_SCENE_PATH),
            debug: DEFAULT_DEBUG,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply_ini(&config);

        info!(
            "Loaded config: {}x{} window, fps={}, vsync={}, ppu={}, scene={}, debug={}",
            self.window_width,
            self.window_height,
            self.target_fps,
            self.vsync,
            self.pixels_per_unit,
            self.scene_path.display(),
            self.debug
        );

        Ok(())
    }

    /// Load configuration from INI text instead of a file.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply_ini(&config);
        Ok(())
    }

    fn apply_ini(&mut self, config: &Ini) {
        // [window] section
        if let Some(width) = config.getuint("window", "width").ok().flatten() {
            self.window_width = width as u32;
        }
        if let Some(height) = config.getuint("window", "height").ok().flatten() {
            self.window_height = height as u32;
        }
        if let Some(fps) = config.getuint("window", "target_fps").ok().flatten() {
            self.target_fps = fps as u32;
        }
        if let Some(vsync) = config.getbool("window", "vsync").ok().flatten() {
            self.vsync = vsync;
        }

        // [render] section
        if let Some(ppu) = config.getfloat("render", "pixels_per_unit").ok().flatten() {
            if ppu > 0.0 {
                self.pixels_per_unit = ppu as f32;
            }
        }

        // [scene] section
        if let Some(path) = config.get("scene", "path") {
            self.scene_path = PathBuf::from(path);
        }

        // [debug] section
        if let Some(enabled) = config.getbool("debug", "enabled").ok().flatten() {
            self.debug = enabled;
        }
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set("window", "width", Some(self.window_width.to_string()));
        config.set("window", "height", Some(self.window_height.to_string()));
        config.set("window", "target_fps", Some(self.target_fps.to_string()));
        config.set("window", "vsync", Some(self.vsync.to_string()));
        config.set(
            "render",
            "pixels_per_unit",
            Some(self.pixels_per_unit.to_string()),
        );
        config.set(
            "scene",
            "path",
            Some(self.scene_path.to_string_lossy().into_owned()),
        );
        config.set("debug", "enabled", Some(self.debug.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to write config file: {}", e))?;

        info!("Saved config to {}", self.config_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::new();
        assert_eq!(config.window_width, DEFAULT_WINDOW_WIDTH);
        assert_eq!(config.window_height, DEFAULT_WINDOW_HEIGHT);
        assert_eq!(config.target_fps, DEFAULT_TARGET_FPS);
        assert!(config.vsync);
        assert!(!config.debug);
        assert_eq!(config.scene_path, PathBuf::from(DEFAULT_SCENE_PATH));
    }

    #[test]
    fn test_load_from_str_overrides_present_keys_only() {
        let mut config = GameConfig::new();
        config
            .load_from_str(
                "[window]\nwidth = 800\n\n[scene]\npath = ./other.json\n\n[debug]\nenabled = true\n",
            )
            .unwrap();
        assert_eq!(config.window_width, 800);
        assert_eq!(config.window_height, DEFAULT_WINDOW_HEIGHT);
        assert_eq!(config.scene_path, PathBuf::from("./other.json"));
        assert!(config.debug);
    }

    #[test]
    fn test_non_positive_pixels_per_unit_is_ignored() {
        let mut config = GameConfig::new();
        config
            .load_from_str("[render]\npixels_per_unit = 0\n")
            .unwrap();
        assert_eq!(config.pixels_per_unit, DEFAULT_PIXELS_PER_UNIT);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let mut config = GameConfig::with_path("./definitely/not/here.ini");
        assert!(config.load_from_file().is_err());
        assert_eq!(config.window_width, DEFAULT_WINDOW_WIDTH);
    }

    #[test]
    fn test_save_then_load_keeps_values() {
        let path = std::env::temp_dir().join(format!("wayfarer-config-{}.ini", std::process::id()));
        let mut saved = GameConfig::with_path(&path);
        saved.window_width = 640;
        saved.debug = true;
        saved.save_to_file().unwrap();

        let mut loaded = GameConfig::with_path(&path);
        loaded.load_from_file().unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.window_width, 640);
        assert!(loaded.debug);
    }
}

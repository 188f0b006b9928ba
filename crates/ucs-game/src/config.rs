#![forbid(unsafe_code)]

//! Simulation settings.
//!
//! Sources, lowest precedence first: built-in defaults, an optional JSON
//! file, `UCS_*` environment variables, command-line flags. The merged value
//! is validated once, before the first frame.
//!
//! ```text
//!   UCS_FPS             Override --fps
//!   UCS_FRAMES          Override --frames
//!   UCS_TILE_SIZE       Override --tile-size
//!   UCS_PROMPT_FRAMES   Override --prompt-frames
//!   UCS_LOG_FORMAT      Override --log-format (text|json)
//! ```

use std::path::Path;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use ucs_core::Key;

use crate::error::{GameError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Key names for one player: up, down, left, right, primary, secondary.
///
/// `primary` and `secondary` are the attack and use keys. Nothing in the
/// tutorial reads them yet; they are still resolved and validated so config
/// files stay valid once a melee entity binds them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMap {
    pub up: String,
    pub down: String,
    pub left: String,
    pub right: String,
    pub primary: String,
    pub secondary: String,
}

impl ControlMap {
    fn named(keys: [&str; 6]) -> Self {
        let [up, down, left, right, primary, secondary] = keys.map(str::to_string);
        Self {
            up,
            down,
            left,
            right,
            primary,
            secondary,
        }
    }

    /// Resolve the key names.
    ///
    /// # Errors
    ///
    /// [`GameError::Config`] naming the first unknown key.
    pub fn resolve(&self) -> Result<Controls> {
        let key = |name: &str| {
            Key::from_name(name).ok_or_else(|| GameError::config(format!("unknown key {name:?}")))
        };
        Ok(Controls {
            up: key(&self.up)?,
            down: key(&self.down)?,
            left: key(&self.left)?,
            right: key(&self.right)?,
            primary: key(&self.primary)?,
            secondary: key(&self.secondary)?,
        })
    }
}

/// Resolved control map of one player. `primary` and `secondary` are
/// reserved, see [`ControlMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub up: Key,
    pub down: Key,
    pub left: Key,
    pub right: Key,
    pub primary: Key,
    pub secondary: Key,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Simulation frames per second.
    pub fps: u32,
    /// Frames the demo runs before stopping.
    pub frames: u64,
    /// Tile edge in pixels.
    pub tile_size: i32,
    /// Frames a message stays up before the headless runner dismisses it.
    pub prompt_frames: u64,
    pub log_format: LogFormat,
    /// One control map per player.
    pub controls: Vec<ControlMap>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            frames: 600,
            tile_size: 16,
            prompt_frames: 30,
            log_format: LogFormat::Text,
            controls: vec![
                ControlMap::named(["w", "s", "a", "d", "q", "e"]),
                ControlMap::named(["up", "down", "left", "right", "j", "k"]),
            ],
        }
    }
}

/// Overrides collected from flags or the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub fps: Option<u32>,
    pub frames: Option<u64>,
    pub tile_size: Option<i32>,
    pub prompt_frames: Option<u64>,
    pub log_format: Option<LogFormat>,
}

impl Overrides {
    /// Read the `UCS_*` variables through `lookup`. Unparsable values are
    /// ignored, like unset ones.
    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut out = Self::default();
        if let Some(val) = lookup("UCS_FPS")
            && let Ok(n) = val.parse()
        {
            out.fps = Some(n);
        }
        if let Some(val) = lookup("UCS_FRAMES")
            && let Ok(n) = val.parse()
        {
            out.frames = Some(n);
        }
        if let Some(val) = lookup("UCS_TILE_SIZE")
            && let Ok(n) = val.parse()
        {
            out.tile_size = Some(n);
        }
        if let Some(val) = lookup("UCS_PROMPT_FRAMES")
            && let Ok(n) = val.parse()
        {
            out.prompt_frames = Some(n);
        }
        if let Some(val) = lookup("UCS_LOG_FORMAT")
            && let Ok(format) = LogFormat::from_str(&val, true)
        {
            out.log_format = Some(format);
        }
        out
    }
}

impl SimConfig {
    /// Parse a JSON config file. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// I/O and JSON errors.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| GameError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(fps) = overrides.fps {
            self.fps = fps;
        }
        if let Some(frames) = overrides.frames {
            self.frames = frames;
        }
        if let Some(tile_size) = overrides.tile_size {
            self.tile_size = tile_size;
        }
        if let Some(prompt_frames) = overrides.prompt_frames {
            self.prompt_frames = prompt_frames;
        }
        if let Some(format) = overrides.log_format {
            self.log_format = format;
        }
    }

    /// # Errors
    ///
    /// [`GameError::Config`] describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if !(1..=1000).contains(&self.fps) {
            return Err(GameError::config(format!(
                "fps must be within 1..=1000, got {}",
                self.fps
            )));
        }
        if self.frames == 0 {
            return Err(GameError::config("frames must be positive"));
        }
        if self.tile_size <= 0 {
            return Err(GameError::config(format!(
                "tile size must be positive, got {}",
                self.tile_size
            )));
        }
        if self.controls.is_empty() {
            return Err(GameError::config("at least one control map is required"));
        }
        for map in &self.controls {
            map.resolve()?;
        }
        Ok(())
    }

    #[must_use]
    pub fn time_step(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.fps.max(1)))
    }

    /// Controls of player `index`.
    ///
    /// # Errors
    ///
    /// [`GameError::Config`] if there is no such map or a key is unknown.
    pub fn controls(&self, index: usize) -> Result<Controls> {
        self.controls
            .get(index)
            .ok_or_else(|| GameError::config(format!("no control map for player {index}")))?
            .resolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_the_tutorial_constants() {
        let config = SimConfig::default();
        config.validate().unwrap();
        assert_eq!(config.time_step(), ucs_core::TIME_STEP);

        let p0 = config.controls(0).unwrap();
        assert_eq!(
            (p0.up, p0.down, p0.left, p0.right, p0.primary, p0.secondary),
            (Key::W, Key::S, Key::A, Key::D, Key::Q, Key::E)
        );
        let p1 = config.controls(1).unwrap();
        assert_eq!(
            (p1.up, p1.down, p1.left, p1.right, p1.primary, p1.secondary),
            (Key::UP, Key::DOWN, Key::LEFT, Key::RIGHT, Key::J, Key::K)
        );
        assert!(config.controls(2).is_err());
    }

    #[test]
    fn env_overrides_skip_garbage() {
        let vars: HashMap<&str, &str> = [
            ("UCS_FPS", "30"),
            ("UCS_FRAMES", "many"),
            ("UCS_LOG_FORMAT", "JSON"),
        ]
        .into_iter()
        .collect();
        let overrides = Overrides::from_env(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(overrides.fps, Some(30));
        assert_eq!(overrides.frames, None);
        assert_eq!(overrides.log_format, Some(LogFormat::Json));

        let mut config = SimConfig::default();
        config.apply(&overrides);
        assert_eq!(config.fps, 30);
        assert_eq!(config.frames, 600);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: SimConfig =
            serde_json::from_str(r#"{ "fps": 120, "log_format": "json" }"#).unwrap();
        assert_eq!(config.fps, 120);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.tile_size, 16);
        assert_eq!(config.controls.len(), 2);
    }

    #[test]
    fn unknown_json_keys_are_rejected() {
        let err = serde_json::from_str::<SimConfig>(r#"{ "fsp": 120 }"#).unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn validation_reports_bad_settings() {
        let mut config = SimConfig {
            fps: 0,
            ..SimConfig::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("fps"));

        config.fps = 60;
        config.controls[0].up = "hyper".into();
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid config: unknown key \"hyper\"");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn reserved_action_keys_are_validated_too() {
        let mut config = SimConfig::default();
        config.controls[1].secondary = "meta".into();
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid config: unknown key \"meta\"");
        assert!(config.controls(0).is_ok());
        assert!(config.controls(1).is_err());
    }
}

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use engine::{LoopConfig, SessionConfig};
use serde::Deserialize;
use thiserror::Error;

pub(crate) const SETTINGS_FILE: &str = "settings.json";

/// Optional `assets/settings.json`. Every field falls back to its default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameSettings {
    pub(crate) window_title: String,
    pub(crate) window_width: u32,
    pub(crate) window_height: u32,
    pub(crate) tick_ms: u64,
    pub(crate) interaction_animation_ms: u64,
    pub(crate) max_ticks_per_frame: Option<u32>,
    /// Level file, relative to the assets directory.
    pub(crate) level: String,
}

impl Default for GameSettings {
    fn default() -> Self {
        let loop_defaults = LoopConfig::default();
        let session_defaults = SessionConfig::default();
        Self {
            window_title: loop_defaults.window_title,
            window_width: loop_defaults.window_width,
            window_height: loop_defaults.window_height,
            tick_ms: session_defaults.tick_duration.as_millis() as u64,
            interaction_animation_ms: session_defaults.interaction_animation.as_millis() as u64,
            max_ticks_per_frame: loop_defaults.max_ticks_per_frame,
            level: "levels/ship.lvl".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid settings in {path} at {field}: {source}")]
    Parse {
        path: PathBuf,
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid settings in {path}: {field} {message}")]
    Invalid {
        path: PathBuf,
        field: &'static str,
        message: &'static str,
    },
}

impl GameSettings {
    pub(crate) fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            window_title: self.window_title.clone(),
            window_width: self.window_width,
            window_height: self.window_height,
            tick_duration: Duration::from_millis(self.tick_ms),
            max_ticks_per_frame: self.max_ticks_per_frame,
            ..LoopConfig::default()
        }
    }

    pub(crate) fn session_config(&self) -> SessionConfig {
        SessionConfig {
            tick_duration: Duration::from_millis(self.tick_ms),
            interaction_animation: Duration::from_millis(self.interaction_animation_ms),
        }
    }

    pub(crate) fn level_path(&self, assets_dir: &Path) -> PathBuf {
        assets_dir.join(&self.level)
    }

    fn validate(&self, path: &Path) -> Result<(), SettingsError> {
        let invalid = |field: &'static str, message: &'static str| SettingsError::Invalid {
            path: path.to_path_buf(),
            field,
            message,
        };
        if self.window_width == 0 {
            return Err(invalid("window_width", "must be positive"));
        }
        if self.window_height == 0 {
            return Err(invalid("window_height", "must be positive"));
        }
        if self.tick_ms == 0 {
            return Err(invalid("tick_ms", "must be positive"));
        }
        if self.max_ticks_per_frame == Some(0) {
            return Err(invalid("max_ticks_per_frame", "must be positive or null"));
        }
        let level = Path::new(&self.level);
        let stays_inside_assets = level
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if self.level.is_empty() || !stays_inside_assets {
            return Err(invalid("level", "must be a relative path inside assets/"));
        }
        Ok(())
    }
}

/// Reads settings from `path`; a missing file yields the defaults.
pub(crate) fn load_settings(path: &Path) -> Result<GameSettings, SettingsError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(source) if source.kind() == io::ErrorKind::NotFound => {
            return Ok(GameSettings::default())
        }
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    parse_settings(&raw, path)
}

fn parse_settings(raw: &str, path: &Path) -> Result<GameSettings, SettingsError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let settings: GameSettings = serde_path_to_error::deserialize(&mut deserializer).map_err(
        |error| {
            let field = error.path().to_string();
            SettingsError::Parse {
                path: path.to_path_buf(),
                field,
                source: error.into_inner(),
            }
        },
    )?;
    settings.validate(path)?;
    Ok(settings)
}

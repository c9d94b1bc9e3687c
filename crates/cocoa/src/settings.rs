//! Engine configuration.
//!
//! [`EngineSettings`] collects the tunables of the renderer, the physics
//! world, and the window. Every field has a default, so a settings file only
//! needs the keys it changes:
//!
//! ```json
//! { "render": { "max_batch_quads": 2000 }, "window": { "title": "Level 1" } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("cannot read settings '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid setting: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Quads per batch before a new batch is opened.
    pub max_batch_quads: usize,
    pub clear_color: [f64; 4],
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            max_batch_quads: 1000,
            clear_color: [0.1, 0.1, 0.15, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Physics2dSettings {
    pub gravity: [f32; 2],
    /// Fixed simulation step, seconds.
    pub timestep: f32,
    pub velocity_iterations: usize,
    pub position_iterations: usize,
}

impl Default for Physics2dSettings {
    fn default() -> Self {
        Self {
            gravity: [0.0, -10.0],
            timestep: 1.0 / 60.0,
            velocity_iterations: 8,
            position_iterations: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Cocoa Level Editor".to_owned(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub render: RenderSettings,
    pub physics: Physics2dSettings,
    pub window: WindowSettings,
}

impl EngineSettings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("loaded engine settings from {}", path.display());
        Ok(settings)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("{e}; using default settings");
            Self::default()
        })
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.render.max_batch_quads == 0 {
            return Err(SettingsError::Invalid("render.max_batch_quads must be at least 1"));
        }
        if !(self.physics.timestep > 0.0) {
            return Err(SettingsError::Invalid("physics.timestep must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let s = EngineSettings::from_json(r#"{ "render": { "max_batch_quads": 64 } }"#).unwrap();
        assert_eq!(s.render.max_batch_quads, 64);
        assert_eq!(s.render.clear_color, RenderSettings::default().clear_color);
        assert_eq!(s.physics.velocity_iterations, 8);
        assert_eq!(s.window.width, 1280);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let err = EngineSettings::from_json(r#"{ "render": { "max_batch_quads": 0 } }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let s = EngineSettings::load_or_default("no/such/settings.json");
        assert_eq!(s, EngineSettings::default());
    }
}

//! Project and editor-data files.
//!
//! Both are flat JSON objects with PascalCase string keys:
//!
//! ```json
//! { "ProjectPath": "games/demo.cprj", "CurrentScene": "scenes/level1.json",
//!   "WorkingDirectory": "games/" }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("cannot access '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid project JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// The project the editor has open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProjectData {
    pub project_path: String,
    pub current_scene: String,
    pub working_directory: String,
}

/// Editor preferences that outlive a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EditorData {
    pub project_path: String,
    pub editor_style: String,
    #[serde(rename = "ImGuiConfig")]
    pub imgui_config: String,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ProjectError> {
    let json = std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&json)?)
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), ProjectError> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(|source| ProjectError::Io {
        path: path.display().to_string(),
        source,
    })
}

impl ProjectData {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        read_json(path.as_ref())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ProjectError> {
        write_json(self, path.as_ref())
    }

    /// The current scene's path, relative to the working directory unless
    /// it is already absolute.
    pub fn current_scene_path(&self) -> Option<std::path::PathBuf> {
        if self.current_scene.is_empty() {
            return None;
        }
        let scene = Path::new(&self.current_scene);
        if scene.is_absolute() || self.working_directory.is_empty() {
            Some(scene.to_path_buf())
        } else {
            Some(Path::new(&self.working_directory).join(scene))
        }
    }
}

impl EditorData {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        read_json(path.as_ref())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ProjectError> {
        write_json(self, path.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_uses_pascal_case_keys() {
        let project = ProjectData {
            project_path: "demo.cprj".into(),
            current_scene: "level1.json".into(),
            working_directory: "games".into(),
        };
        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["ProjectPath"], "demo.cprj");
        assert_eq!(json["CurrentScene"], "level1.json");
        assert_eq!(json["WorkingDirectory"], "games");
        assert_eq!(
            project.current_scene_path(),
            Some(Path::new("games").join("level1.json"))
        );
    }

    #[test]
    fn editor_data_keys_and_file_round_trip() {
        let path = std::env::temp_dir().join("cocoa_editor_data.json");
        let data = EditorData {
            project_path: "demo.cprj".into(),
            editor_style: "Dark".into(),
            imgui_config: "imgui.ini".into(),
        };
        data.save(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["ImGuiConfig"], "imgui.ini");
        assert_eq!(raw["EditorStyle"], "Dark");
        assert_eq!(EditorData::load(&path).unwrap(), data);
    }

    #[test]
    fn missing_keys_default_to_empty() {
        let project: ProjectData = serde_json::from_str(r#"{ "ProjectPath": "x" }"#).unwrap();
        assert_eq!(project.current_scene, "");
        assert_eq!(project.current_scene_path(), None);
    }
}

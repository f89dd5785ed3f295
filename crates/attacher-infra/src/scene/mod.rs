// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Scene descriptions: the models a host spawns at startup, plus the
//! per-plugin configuration sections handed to plugins on load.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use attacher_core::math::{Pose, Vec3};
use attacher_core::world::SCOPE_DELIMITER;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Errors raised while loading or validating a scene description.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The scene file could not be read.
    #[error("failed to read scene '{path}': {source}")]
    Io {
        /// Path of the scene file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The scene file is not a valid scene description.
    #[error("failed to parse scene '{path}': {source}")]
    Parse {
        /// Path of the scene file.
        path: PathBuf,
        /// Underlying decoding error.
        #[source]
        source: serde_json::Error,
    },
    /// Two models, or two links of one model, share a name.
    #[error("duplicate name '{0}'")]
    DuplicateName(String),
    /// A name is empty or contains the scope delimiter.
    #[error("invalid entity name '{0}'")]
    InvalidName(String),
    /// A plugin configuration section does not match the plugin's schema.
    #[error("invalid configuration for plugin '{plugin}': {source}")]
    PluginConfig {
        /// Plugin section name.
        plugin: String,
        /// Underlying decoding error.
        #[source]
        source: serde_json::Error,
    },
}

/// How a link's rigid body is simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    /// Responds to forces and collisions.
    #[default]
    Dynamic,
    /// Fixed in place.
    Static,
    /// Moved only by pose updates.
    Kinematic,
}

/// A link to spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkDesc {
    /// Link name, unique within its model.
    pub name: String,
    /// Pose relative to the owning model.
    #[serde(default)]
    pub pose: Pose,
    /// Simulation mode of the body.
    #[serde(default)]
    pub body_type: BodyKind,
    /// Mass in kg. Links without one report no inertial.
    #[serde(default)]
    pub mass: Option<f32>,
    /// Half extents of the link's box collider.
    #[serde(default = "default_half_extents")]
    pub half_extents: Vec3,
}

/// A model to spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDesc {
    /// Model name, unique within the world.
    pub name: String,
    /// World pose of the model origin.
    #[serde(default)]
    pub pose: Pose,
    /// Links of the model.
    #[serde(default)]
    pub links: Vec<LinkDesc>,
}

/// A full scene description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDesc {
    /// World gravity.
    #[serde(default = "default_gravity")]
    pub gravity: Vec3,
    /// Start paused.
    #[serde(default)]
    pub paused: bool,
    /// Models to spawn.
    #[serde(default)]
    pub models: Vec<ModelDesc>,
    /// Raw configuration sections keyed by plugin name.
    #[serde(default)]
    pub plugins: HashMap<String, serde_json::Value>,
}

impl Default for SceneDesc {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            paused: false,
            models: Vec::new(),
            plugins: HashMap::new(),
        }
    }
}

fn default_gravity() -> Vec3 {
    Vec3::new(0.0, 0.0, -9.81)
}

fn default_half_extents() -> Vec3 {
    Vec3::new(0.05, 0.05, 0.05)
}

impl SceneDesc {
    /// Checks that every model and link name is usable as a scoped name.
    pub fn validate(&self) -> Result<(), SceneError> {
        let mut models = HashSet::new();
        for model in &self.models {
            check_name(&model.name)?;
            if !models.insert(model.name.as_str()) {
                return Err(SceneError::DuplicateName(model.name.clone()));
            }
            let mut links = HashSet::new();
            for link in &model.links {
                check_name(&link.name)?;
                if !links.insert(link.name.as_str()) {
                    return Err(SceneError::DuplicateName(format!(
                        "{}{SCOPE_DELIMITER}{}",
                        model.name, link.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Decodes the configuration section of `plugin`, falling back to the
    /// type's default when the scene has none.
    pub fn plugin_config<T: DeserializeOwned + Default>(
        &self,
        plugin: &str,
    ) -> Result<T, SceneError> {
        match self.plugins.get(plugin) {
            Some(value) => {
                serde_json::from_value(value.clone()).map_err(|source| SceneError::PluginConfig {
                    plugin: plugin.to_string(),
                    source,
                })
            }
            None => Ok(T::default()),
        }
    }
}

fn check_name(name: &str) -> Result<(), SceneError> {
    if name.is_empty() || name.contains(SCOPE_DELIMITER) {
        Err(SceneError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

/// Reads, parses, and validates a JSON scene file.
pub fn load_scene(path: impl AsRef<Path>) -> Result<SceneDesc, SceneError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let scene: SceneDesc = serde_json::from_str(&text).map_err(|source| SceneError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    scene.validate()?;
    log::info!(
        "Loaded scene '{}' ({} model(s))",
        path.display(),
        scene.models.len()
    );
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SCENE: &str = r#"{
        "paused": true,
        "models": [
            { "name": "robot", "links": [ { "name": "arm", "body_type": "static" } ] },
            {
                "name": "box",
                "pose": { "position": { "x": 1.0, "y": 0.0, "z": 0.5 } },
                "links": [ { "name": "box_link", "mass": 0.2 } ]
            }
        ],
        "plugins": { "link_attacher": { "node_name": "attacher" } }
    }"#;

    fn write_scene(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_scene_applies_defaults() {
        let file = write_scene(SCENE);
        let scene = load_scene(file.path()).unwrap();

        assert!(scene.paused);
        assert_eq!(scene.gravity, Vec3::new(0.0, 0.0, -9.81));
        assert_eq!(scene.models.len(), 2);

        let arm = &scene.models[0].links[0];
        assert_eq!(arm.body_type, BodyKind::Static);
        assert_eq!(arm.mass, None);
        assert_eq!(arm.half_extents, Vec3::new(0.05, 0.05, 0.05));

        let cube = &scene.models[1];
        assert_eq!(cube.pose.position, Vec3::new(1.0, 0.0, 0.5));
        assert_eq!(cube.links[0].body_type, BodyKind::Dynamic);
        assert_eq!(cube.links[0].mass, Some(0.2));
    }

    #[test]
    fn test_plugin_config_section() {
        #[derive(Debug, Default, Deserialize, PartialEq)]
        struct Cfg {
            #[serde(default)]
            node_name: String,
        }

        let file = write_scene(SCENE);
        let scene = load_scene(file.path()).unwrap();
        let cfg: Cfg = scene.plugin_config("link_attacher").unwrap();
        assert_eq!(cfg.node_name, "attacher");
        let missing: Cfg = scene.plugin_config("other").unwrap();
        assert_eq!(missing, Cfg::default());
    }

    #[test]
    fn test_duplicate_and_invalid_names_are_rejected() {
        let file = write_scene(r#"{ "models": [ { "name": "a" }, { "name": "a" } ] }"#);
        assert!(matches!(
            load_scene(file.path()),
            Err(SceneError::DuplicateName(name)) if name == "a"
        ));

        let file = write_scene(
            r#"{ "models": [ { "name": "a", "links": [ { "name": "l" }, { "name": "l" } ] } ] }"#,
        );
        assert!(matches!(
            load_scene(file.path()),
            Err(SceneError::DuplicateName(name)) if name == "a::l"
        ));

        let file = write_scene(r#"{ "models": [ { "name": "a::b" } ] }"#);
        assert!(matches!(
            load_scene(file.path()),
            Err(SceneError::InvalidName(_))
        ));
    }

    #[test]
    fn test_missing_file_and_bad_json() {
        assert!(matches!(
            load_scene("/definitely/not/here.json"),
            Err(SceneError::Io { .. })
        ));
        let file = write_scene("{ not json");
        assert!(matches!(
            load_scene(file.path()),
            Err(SceneError::Parse { .. })
        ));
    }
}

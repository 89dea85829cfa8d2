//! Simulation settings file (YAML or JSON, chosen by extension).

use std::path::{Path, PathBuf};

use cellstream::StreamConfig;
use serde::{Deserialize, Serialize};

/// Errors from loading a settings file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported settings format: {0}")]
    UnknownFormat(PathBuf),
}

/// How the simulated world is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    /// Number of placeables scattered over the world.
    pub placeables: usize,
    /// Placeables are scattered over `[-extent, extent]` on both axes.
    pub extent: f32,
    /// Number of distinct templates to draw from.
    pub templates: u64,
    pub seed: u64,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            placeables: 2000,
            extent: 128.0,
            templates: 4,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub stream: StreamConfig,
    pub world: WorldSettings,
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Ok(serde_yaml::from_str(&text)?),
            Some("json") => Ok(serde_json::from_str(&text)?),
            _ => Err(LoadError::UnknownFormat(path.to_path_buf())),
        }
    }

    pub fn to_yaml(&self) -> Result<String, LoadError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn loads_partial_yaml_with_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sim.yaml");
        std::fs::write(
            &path,
            "stream:\n  half_extents: [4.0, 6.0]\nworld:\n  placeables: 10\n",
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.stream.half_extents, Vec2::new(4.0, 6.0));
        assert_eq!(settings.stream.movement_threshold, 1.0);
        assert_eq!(settings.world.placeables, 10);
        assert_eq!(settings.world.seed, 42);
    }

    #[test]
    fn loads_json() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sim.json");
        std::fs::write(&path, r#"{"stream": {"movement_threshold": 0.25}}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.stream.movement_threshold, 0.25);
        assert_eq!(settings.world, WorldSettings::default());
    }

    #[test]
    fn yaml_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sim.yml");
        let settings = Settings::default();
        std::fs::write(&path, settings.to_yaml().unwrap()).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn unknown_extension_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sim.toml");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(
            Settings::load(&path),
            Err(LoadError::UnknownFormat(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            Settings::load(tmp.path().join("absent.yaml")),
            Err(LoadError::Io(_))
        ));
    }
}

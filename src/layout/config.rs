use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read layout config {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid layout config {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Tunable constants of the layout engine.
///
/// Every field has a default, so a config file only needs the keys it
/// wants to change.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Many-body charge. Negative values repel.
    pub charge: f32,
    /// Barnes–Hut opening angle.
    pub theta: f32,
    /// Added to the display radius to form the collision disk.
    pub collision_margin: f32,
    pub collision_strength: f32,
    pub hull_strength: f32,
    /// Centroid distance under which two territories push apart.
    pub cluster_threshold: f32,
    pub cluster_strength: f32,
    /// Added to the display radius when padding a territory outline.
    pub territory_margin: f32,
    /// Display radius used for hull vertices with no resolvable node.
    pub fallback_radius: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    pub alpha: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    /// Alpha target held while any node is pinned.
    pub drag_alpha_target: f32,
    /// Fraction of velocity removed every tick.
    pub velocity_decay: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            charge: -250.0,
            theta: 0.9,
            collision_margin: 5.0,
            collision_strength: 1.0,
            hull_strength: 1.2,
            cluster_threshold: 1.0,
            cluster_strength: 5.0,
            territory_margin: 15.0,
            fallback_radius: 30.0,
            min_radius: 15.0,
            max_radius: 80.0,
            alpha: 1.0,
            alpha_min: 0.001,
            alpha_decay: 1.0 - 0.001_f32.powf(1.0 / 300.0),
            drag_alpha_target: 0.3,
            velocity_decay: 0.4,
        }
    }
}

impl LayoutConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

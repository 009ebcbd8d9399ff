use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::kernel::snapshot::blocks::MAX_NEIGHBORHOOD_RADIUS;
use crate::kernel::snapshot::AssemblerConfig;
use crate::kernel::time::ticks_to_duration;

pub const DEFAULT_OUTPUT_FILE: &str = "Training/datasets/latest-user-telemetry.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Recorder settings. Consumers use the [`normalized`](Self::normalized) form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RecorderConfig {
    /// Observed actor name; empty selects the first online actor.
    pub target_player: String,
    pub output_file: String,
    pub line_of_sight_max_distance: u32,
    pub nearby_block_radius: u32,
    pub nearby_entity_distance: u32,
    pub action_ttl_ms: i64,
    pub sample_interval_ticks: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            target_player: String::new(),
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
            line_of_sight_max_distance: 8,
            nearby_block_radius: 2,
            nearby_entity_distance: 10,
            action_ttl_ms: 1500,
            sample_interval_ticks: 2,
        }
    }
}

impl RecorderConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads a JSON config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Applies the bounds and trims the string settings. A blank output
    /// file falls back to the default.
    pub fn normalized(&self) -> Self {
        let output_file = match self.output_file.trim() {
            "" => DEFAULT_OUTPUT_FILE,
            trimmed => trimmed,
        };
        Self {
            target_player: self.target_player.trim().to_string(),
            output_file: output_file.to_string(),
            line_of_sight_max_distance: self.line_of_sight_max_distance.max(1),
            nearby_block_radius: self.nearby_block_radius.clamp(1, MAX_NEIGHBORHOOD_RADIUS),
            nearby_entity_distance: self.nearby_entity_distance.max(2),
            action_ttl_ms: self.action_ttl_ms.max(250),
            sample_interval_ticks: self.sample_interval_ticks.max(1),
        }
    }

    pub fn assembler(&self) -> AssemblerConfig {
        AssemblerConfig {
            line_of_sight_max_distance: self.line_of_sight_max_distance,
            nearby_block_radius: self.nearby_block_radius,
            nearby_entity_distance: self.nearby_entity_distance,
        }
    }

    pub fn sample_interval(&self) -> Duration {
        ticks_to_duration(self.sample_interval_ticks.max(1))
    }

    /// Absolute output paths are kept; relative ones hang off `base_dir`.
    pub fn resolve_output_path(&self, base_dir: &Path) -> PathBuf {
        let configured = Path::new(self.output_file.trim());
        if configured.is_absolute() {
            return configured.to_path_buf();
        }
        lexical_normalize(&base_dir.join(configured))
    }
}

/// Resolves `.` and `..` without touching the filesystem.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_))) && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

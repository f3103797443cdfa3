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

//! Engine-wide configuration.

use std::path::{Path, PathBuf};

use lucent_agents::{FollowerConfig, ParallaxConfig};
use lucent_control::{MonitorConfig, RuntimeConfig};
use lucent_lanes::ParticleFieldConfig;
use serde::{Deserialize, Serialize};

/// Errors raised while loading an [`EngineConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config '{path}': {source}")]
    Io {
        /// The file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// The document parsed but holds unusable values.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything tunable, grouped per component. Missing fields take their
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Quality adaptation.
    pub monitor: MonitorConfig,
    /// Frame loop and pointer input.
    pub runtime: RuntimeConfig,
    /// Particle fields created through the engine.
    pub particle: ParticleFieldConfig,
    /// Cursor followers created through the engine.
    pub follower: FollowerConfig,
    /// Parallax effects created through the engine.
    pub parallax: ParallaxConfig,
    /// Depth factor of each parallax layer, front to back.
    pub parallax_depths: Vec<f32>,
    /// Time every tick into `lucent:tick_cost_ms`.
    pub time_ticks: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            runtime: RuntimeConfig::default(),
            particle: ParticleFieldConfig::default(),
            follower: FollowerConfig::default(),
            parallax: ParallaxConfig::default(),
            parallax_depths: vec![0.2, 0.5, 1.0],
            time_ticks: true,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded engine config from {}.", path.display());
        Ok(config)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rejects values no component can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let monitor = &self.monitor;
        if !(monitor.window_ms.is_finite() && monitor.window_ms > 0.0) {
            return Err(ConfigError::Invalid("monitor.window_ms must be positive".into()));
        }
        if monitor.downgrade_windows == 0 || monitor.upgrade_windows == 0 {
            return Err(ConfigError::Invalid(
                "monitor window counts must be at least 1".into(),
            ));
        }
        if !(self.runtime.max_delta_ms.is_finite() && self.runtime.max_delta_ms > 0.0) {
            return Err(ConfigError::Invalid("runtime.max_delta_ms must be positive".into()));
        }
        self.particle
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("particle: {e}")))?;
        if self.parallax_depths.iter().any(|d| !d.is_finite()) {
            return Err(ConfigError::Invalid("parallax depths must be finite".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lucent_core::QualityTier;

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = EngineConfig::from_json(
            r#"{ "monitor": { "downgrade_windows": 3 }, "particle": { "seed": 7 } }"#,
        )
        .unwrap();
        assert_eq!(config.monitor.downgrade_windows, 3);
        assert_eq!(config.monitor.upgrade_windows, MonitorConfig::default().upgrade_windows);
        assert_eq!(config.particle.seed, Some(7));
        assert_eq!(config.particle.population.at(QualityTier::Low), 100);
    }

    #[test]
    fn test_invalid_documents_are_rejected() {
        assert!(matches!(
            EngineConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{ "monitor": { "window_ms": 0 } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{ "particle": { "damping": 2.0 } }"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_json_round_trip_and_missing_file() {
        let config = EngineConfig::default();
        let parsed = EngineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
        assert!(matches!(
            EngineConfig::from_file("/nonexistent/lucent.json"),
            Err(ConfigError::Io { .. })
        ));
    }
}

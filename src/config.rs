//! Engine configuration.
//!
//! Settings come from, in increasing priority: built-in defaults, an optional JSON
//! file, and `SAMPLEPACK_*` environment variables.

use crate::archive::MAX_COMPRESSION_LEVEL;
use crate::error::ConfigError;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_TEMP_DIR: &str = "SAMPLEPACK_TEMP_DIR";
pub const ENV_OUTPUT_DIR: &str = "SAMPLEPACK_OUTPUT_DIR";
pub const ENV_LEVEL: &str = "SAMPLEPACK_LEVEL";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Parent directory for export staging and combine scratch space.
    pub temp_root: PathBuf,
    /// Where the batch combiner places generated archives.
    pub output_dir: PathBuf,
    /// Deflate level for written archives (0-9).
    pub compression_level: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            temp_root: std::env::temp_dir(),
            output_dir: std::env::temp_dir(),
            compression_level: MAX_COMPRESSION_LEVEL,
        }
    }
}

impl EngineConfig {
    /// Loads the config file if given, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_overrides(|var| std::env::var(var).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let config: Self =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        Ok(config.normalized())
    }

    /// Applies overrides looked up through `lookup` (normally the process environment).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_TEMP_DIR).filter(|v| !v.is_empty()) {
            self.temp_root = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(ENV_OUTPUT_DIR).filter(|v| !v.is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup(ENV_LEVEL) {
            self.compression_level = level.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: ENV_LEVEL.to_string(),
                value: level.clone(),
            })?;
        }
        Ok(self.normalized())
    }

    fn normalized(mut self) -> Self {
        self.compression_level = self.compression_level.clamp(0, MAX_COMPRESSION_LEVEL);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn overrides_take_priority_and_level_is_clamped() {
        let env: HashMap<&str, &str> = [(ENV_TEMP_DIR, "/scratch"), (ENV_LEVEL, "42")].into_iter().collect();
        let config = EngineConfig::default()
            .with_overrides(|var| env.get(var).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.temp_root, PathBuf::from("/scratch"));
        assert_eq!(config.output_dir, std::env::temp_dir());
        assert_eq!(config.compression_level, MAX_COMPRESSION_LEVEL);
    }

    #[test]
    fn bad_level_is_rejected() {
        let result = EngineConfig::default().with_overrides(|var| (var == ENV_LEVEL).then(|| "high".to_string()));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn partial_file_keeps_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "compression_level": 3 }"#)?;
        let config = EngineConfig::from_file(&path)?;
        assert_eq!(config.compression_level, 3);
        assert_eq!(config.temp_root, std::env::temp_dir());
        Ok(())
    }
}

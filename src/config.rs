//! Engine configuration.
//!
//! Settings that apply engine-wide: the fast-path switch, the recursion
//! budget, and the default coercion mode. Per-model settings (strict
//! extra-field handling, validate-on-assignment, per-model coercion
//! overrides) live on the model declaration instead.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Engine-wide validation configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Run compiled validators when a spec carries them (default: true)
    #[serde(default = "default_fast_path")]
    pub fast_path: bool,

    /// Maximum nested-model depth before a call fails fast (default: 64)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Default coercion mode: strict rejects numeric strings, integral
    /// floats for int fields, and number/string bools (default: false)
    #[serde(default)]
    pub strict: bool,
}

fn default_fast_path() -> bool {
    true
}

fn default_max_depth() -> usize {
    64
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fast_path: default_fast_path(),
            max_depth: default_max_depth(),
            strict: false,
        }
    }
}

impl EngineConfig {
    /// Returns a config with the fast path disabled.
    pub fn interpreted_only() -> Self {
        Self {
            fast_path: false,
            ..Self::default()
        }
    }

    /// Loads configuration from a JSON file. Absent keys take defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("cannot read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration JSON
    #[error("cannot parse config '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.fast_path);
        assert_eq!(config.max_depth, 64);
        assert!(!config.strict);
    }

    #[test]
    fn test_interpreted_only() {
        let config = EngineConfig::interpreted_only();
        assert!(!config.fast_path);
        assert_eq!(config.max_depth, 64);
    }

    #[test]
    fn test_absent_keys_take_defaults() {
        let config: EngineConfig = serde_json::from_str("{\"strict\": true}").unwrap();
        assert!(config.strict);
        assert!(config.fast_path);
        assert_eq!(config.max_depth, 64);
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("engine.json");
        let mut file = fs::File::create(&path).unwrap();
        write!(file, "{{\"max_depth\": 8, \"fast_path\": false}}").unwrap();

        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.max_depth, 8);
        assert!(!config.fast_path);

        assert!(EngineConfig::from_file(&dir.path().join("absent.json")).is_err());
    }
}

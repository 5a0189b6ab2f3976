// Copyright 2025 Sushanth (https://github.com/sushanthpy)
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

//! Engine configuration
//!
//! Loaded with priority: environment > TOML file > defaults.

use crate::diff::{DiffConfig, DEFAULT_CONTEXT_LINES};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Theme version-control engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub diff: DiffSettings,
    #[serde(default)]
    pub repository: RepositorySettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DiffSettings {
    /// Unchanged lines shown around each change
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RepositorySettings {
    /// Author recorded on engine-generated commits (root, rollback)
    #[serde(default = "default_system_author")]
    pub system_author: String,

    /// Message of the root commit created by `init`
    #[serde(default = "default_initial_message")]
    pub initial_message: String,

    /// Longest accepted commit message, in characters
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,
}

impl Default for DiffSettings {
    fn default() -> Self {
        Self {
            context_lines: default_context_lines(),
        }
    }
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            system_author: default_system_author(),
            initial_message: default_initial_message(),
            max_message_len: default_max_message_len(),
        }
    }
}

// Default values
fn default_context_lines() -> usize {
    DEFAULT_CONTEXT_LINES
}

fn default_system_author() -> String {
    "system".to_string()
}

fn default_initial_message() -> String {
    "Initial commit".to_string()
}

fn default_max_message_len() -> usize {
    4096
}

const ENV_CONTEXT_LINES: &str = "THEMEVC_CONTEXT_LINES";
const ENV_SYSTEM_AUTHOR: &str = "THEMEVC_SYSTEM_AUTHOR";
const ENV_MAX_MESSAGE_LEN: &str = "THEMEVC_MAX_MESSAGE_LEN";

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by environment variables
    ///
    /// Supported environment variables:
    /// - THEMEVC_CONTEXT_LINES: diff context lines (default: 3)
    /// - THEMEVC_SYSTEM_AUTHOR: author of root and rollback commits (default: system)
    /// - THEMEVC_MAX_MESSAGE_LEN: longest commit message (default: 4096)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override fields from a key lookup (environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_CONTEXT_LINES) {
            self.diff.context_lines = parse_number(ENV_CONTEXT_LINES, &raw)?;
        }
        if let Some(author) = lookup(ENV_SYSTEM_AUTHOR) {
            self.repository.system_author = author;
        }
        if let Some(raw) = lookup(ENV_MAX_MESSAGE_LEN) {
            self.repository.max_message_len = parse_number(ENV_MAX_MESSAGE_LEN, &raw)?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repository.system_author.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "repository.system_author".to_string(),
                reason: "must not be blank".to_string(),
            });
        }
        if self.repository.initial_message.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "repository.initial_message".to_string(),
                reason: "must not be blank".to_string(),
            });
        }
        if self.repository.max_message_len == 0 {
            return Err(ConfigError::InvalidValue {
                key: "repository.max_message_len".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.repository.initial_message.chars().count() > self.repository.max_message_len {
            return Err(ConfigError::InvalidValue {
                key: "repository.initial_message".to_string(),
                reason: "longer than repository.max_message_len".to_string(),
            });
        }
        Ok(())
    }

    pub fn diff_config(&self) -> DiffConfig {
        DiffConfig {
            context_lines: self.diff.context_lines,
        }
    }
}

fn parse_number(key: &str, raw: &str) -> Result<usize, ConfigError> {
    raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        reason: format!("{:?}: {}", raw, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.diff.context_lines, 3);
        assert_eq!(config.repository.system_author, "system");
        assert_eq!(config.repository.initial_message, "Initial commit");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = EngineConfig::from_toml("[diff]\ncontext_lines = 5\n").unwrap();
        assert_eq!(config.diff.context_lines, 5);
        assert_eq!(config.repository, RepositorySettings::default());

        let empty = EngineConfig::from_toml("").unwrap();
        assert_eq!(empty, EngineConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            EngineConfig::from_toml("[diff]\ncontext_lines = \"many\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml("[repository]\nsystem_author = \"  \""),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[repository]\nsystem_author = \"theme-bot\"").unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.repository.system_author, "theme-bot");

        assert!(matches!(
            EngineConfig::from_file("/definitely/not/here.toml"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("THEMEVC_CONTEXT_LINES", "1"),
            ("THEMEVC_SYSTEM_AUTHOR", "ci"),
        ]
        .into_iter()
        .collect();

        let mut config = EngineConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.diff.context_lines, 1);
        assert_eq!(config.repository.system_author, "ci");
        assert_eq!(config.repository.max_message_len, 4096);

        let mut bad = EngineConfig::default();
        let err = bad
            .apply_overrides(|key| (key == "THEMEVC_MAX_MESSAGE_LEN").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("THEMEVC_MAX_MESSAGE_LEN"));
    }
}

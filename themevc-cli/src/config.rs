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

//! Command-line configuration: engine settings plus logging and CLI defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use themevc_core::EngineConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(flatten)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub cli: CliSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Default filter directive when RUST_LOG is unset (e.g., "info", "themevc_core=debug")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CliSettings {
    /// Author used by `commit` when `--author` is not given
    #[serde(default = "default_author")]
    pub default_author: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for CliSettings {
    fn default() -> Self {
        Self {
            default_author: default_author(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

const ENV_AUTHOR: &str = "THEMEVC_AUTHOR";

fn default_author() -> String {
    "themevc".to_string()
}

impl CliConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("invalid configuration")?;
        config.engine.validate()?;
        Ok(config)
    }

    /// Load configuration with priority: env > file > defaults
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("cannot read config file {:?}", path))?;
                let mut config = Self::from_toml(&content)?;
                config
                    .engine
                    .apply_overrides(|key| std::env::var(key).ok())?;
                config
            }
            None => Self {
                engine: EngineConfig::from_env()?,
                ..Self::default()
            },
        };

        if let Ok(author) = std::env::var(ENV_AUTHOR) {
            config.cli.default_author = author;
        }
        Ok(config)
    }
}

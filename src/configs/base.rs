use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
  common::errors::{Result, TranscriptError},
  configs::*,
};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
  pub logging: Option<LoggingConfig>,
  #[serde(default)]
  pub transcript: TranscriptConfig,
}

impl Config {
  /// Loads `config.toml`, falling back to `config.default.toml`.
  ///
  /// Returns the built-in defaults when neither file exists.
  pub fn load() -> Result<Self> {
    let config_path = if Path::new("config.toml").exists() {
      "config.toml"
    } else if Path::new("config.default.toml").exists() {
      "config.default.toml"
    } else {
      return Ok(Self::default());
    };

    Self::load_from(config_path)
  }

  pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let config_str = std::fs::read_to_string(path)?;
    if config_str.trim().is_empty() {
      return Err(TranscriptError::Config(format!(
        "{} is empty",
        path.display()
      )));
    }

    Self::parse(&config_str)
  }

  pub fn parse(config_str: &str) -> Result<Self> {
    toml::from_str(config_str).map_err(|e| TranscriptError::Config(e.to_string()))
  }
}

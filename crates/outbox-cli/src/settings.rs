//! Layered runtime settings: defaults, then the config file, then `OUTBOX_*`
//! environment variables. CLI flags are applied on top by `main`.

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use outbox_draft::DraftConfig;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Base URL of the admin backend.
  pub url:                  String,
  pub email:                String,
  pub password:             String,
  pub autosave_debounce_ms: u64,
  pub load_grace_ms:        u64,
  /// Rows per page on the list screen.
  pub page_size:            u32,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      url:                  "http://localhost:3000".into(),
      email:                String::new(),
      password:             String::new(),
      autosave_debounce_ms: 2000,
      load_grace_ms:        500,
      page_size:            10,
    }
  }
}

impl Settings {
  /// Read `path` (if given; it must exist) and the environment.
  pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
      builder = builder.add_source(File::from(path).required(true));
    }
    builder
      .add_source(Environment::with_prefix("OUTBOX"))
      .build()?
      .try_deserialize()
  }

  pub fn draft_config(&self) -> DraftConfig {
    DraftConfig::from_millis(self.autosave_debounce_ms, self.load_grace_ms)
  }
}

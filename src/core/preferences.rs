//! The persisted default model.

use std::path::PathBuf;
use std::sync::Mutex;

use crate::core::config::{Config, ConfigError};

pub trait PreferenceStore {
    fn set_default(&self, model: &str) -> Result<(), ConfigError>;
    fn get_default(&self) -> Result<Option<String>, ConfigError>;
}

/// [`PreferenceStore`] that reads and writes `default_model` in the TOML
/// config file, leaving the other keys untouched.
pub struct ConfigPreferenceStore {
    path: PathBuf,
}

impl ConfigPreferenceStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The store at the platform config location.
    pub fn from_default_location() -> Result<Self, ConfigError> {
        Ok(Self::new(Config::get_config_path()?))
    }
}

impl PreferenceStore for ConfigPreferenceStore {
    fn set_default(&self, model: &str) -> Result<(), ConfigError> {
        let mut config = Config::load_from_path(&self.path)?;
        config.default_model = Some(model.to_string());
        config.save_to_path(&self.path)
    }

    fn get_default(&self) -> Result<Option<String>, ConfigError> {
        let config = Config::load_from_path(&self.path)?;
        Ok(config.default_model.filter(|model| !model.trim().is_empty()))
    }
}

#[derive(Default)]
pub struct MemoryPreferenceStore {
    model: Mutex<Option<String>>,
}

impl PreferenceStore for MemoryPreferenceStore {
    fn set_default(&self, model: &str) -> Result<(), ConfigError> {
        *self.model.lock().unwrap_or_else(|e| e.into_inner()) = Some(model.to_string());
        Ok(())
    }

    fn get_default(&self) -> Result<Option<String>, ConfigError> {
        Ok(self.model.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }
}

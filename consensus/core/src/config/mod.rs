pub mod constants;
pub mod params;

use params::Params;
use serde::{Deserialize, Serialize};
use std::{ops::Deref, path::PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed parsing the config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Engine configuration bundling [`Params`] with storage settings. NOTE: this struct can be
/// implicitly de-refed into `Params`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub params: Params,

    /// Directory of the rocksdb database. `None` means the caller decides (e.g., a temp dir)
    pub db_path: Option<PathBuf>,

    /// Rocksdb background parallelism
    pub db_parallelism: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { params: Params::default(), db_path: None, db_parallelism: 1 }
    }
}

impl Config {
    pub fn new(params: Params) -> Self {
        Self { params, ..Default::default() }
    }

    /// Loads a config from TOML text. Missing tables and keys fall back to defaults
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }
}

impl AsRef<Params> for Config {
    fn as_ref(&self) -> &Params {
        &self.params
    }
}

impl Deref for Config {
    type Target = Params;

    fn deref(&self) -> &Self::Target {
        &self.params
    }
}

//! Configuration for seed runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config file read when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "seed.toml";

/// Environment variable that overrides [`SeedConfig::connection`].
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings for a seed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Table that gets emptied and reseeded.
    pub table: String,

    /// Database connection URL (`postgres://...` or `sqlite://...`).
    pub connection: String,

    /// CSV file used when no source is given on the command line.
    pub source_file: Option<PathBuf>,

    /// Maximum number of rows per INSERT statement.
    pub batch_size: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            table: "zipcodes".to_string(),
            connection: "postgres://localhost:5432/zipcodes".to_string(),
            source_file: None,
            batch_size: 500,
        }
    }
}

impl SeedConfig {
    /// Parses a TOML document. Missing keys take their defaults.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Loads the config used by the `seed` binary.
    ///
    /// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] is
    /// read if present and the defaults are used otherwise. `DATABASE_URL`
    /// is applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => Self::default(),
        };

        Ok(config.with_env(|key| std::env::var(key).ok()))
    }

    /// Applies environment overrides using the given lookup.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(DATABASE_URL_ENV).filter(|u| !u.is_empty()) {
            self.connection = url;
        }
        self
    }

    /// The connection URL with any credentials removed, for display.
    pub fn connection_label(&self) -> String {
        match (self.connection.find("://"), self.connection.rfind('@')) {
            (Some(scheme_end), Some(at)) if at > scheme_end => {
                format!("{}{}", &self.connection[..scheme_end + 3], &self.connection[at + 1..])
            }
            _ => self.connection.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.table.trim().is_empty() {
            return Err(ConfigError::Invalid("table must not be empty".to_string()));
        }
        if self.connection.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "connection must not be empty".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

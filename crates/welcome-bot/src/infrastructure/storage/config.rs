//! TOML-backed [`ConfigStore`].
//!
//! The file holds one top-level key per setting:
//!
//! ```toml
//! enabled_groups = ["1001", "2002"]
//! welcome_message = "欢迎新成员加入群聊"
//! enable_image = true
//! image_folder = "welcome_images"
//! ```
//!
//! Unknown keys are preserved, so the file may be shared with other
//! settings.  A missing file is an empty store; the application then falls
//! back to its defaults key by key.
//!
//! `set` only changes the in-memory table.  `save` rewrites the whole file.

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::application::{ConfigStore, StoreError};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Store ─────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct TomlConfigStore {
    path: PathBuf,
    table: toml::Table,
}

impl TomlConfigStore {
    /// Opens the store at `path`, reading the file if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] for file-system errors other than "not
    /// found", and [`ConfigError::Parse`] if the TOML is malformed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let table = match std::fs::read_to_string(&path) {
            Ok(content) => content.parse::<toml::Table>()?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("no config at {}; starting with defaults", path.display());
                toml::Table::new()
            }
            Err(e) => return Err(ConfigError::Io { path, source: e }),
        };
        Ok(Self { path, table })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the table to disk, creating the parent directory if needed.
    fn write(&self) -> Result<(), ConfigError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let content = toml::to_string_pretty(&self.table)?;
        std::fs::write(&self.path, content).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!("config saved to {}", self.path.display());
        Ok(())
    }
}

impl ConfigStore for TomlConfigStore {
    fn get(&self, key: &str) -> Option<Value> {
        let value = self.table.get(key)?;
        serde_json::to_value(value).ok()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        let value = toml::Value::try_from(value).map_err(|e| StoreError::InvalidValue {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.table.insert(key.to_string(), value);
        Ok(())
    }

    fn save(&mut self) -> Result<(), StoreError> {
        self.write().map_err(|e| StoreError::Save(e.to_string()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Test doubles shared by the application-layer unit tests.
//!
//! - [`MemoryStore`] keeps pending and durable values in separate maps so a
//!   test can "restart" by building a new store from the durable copy.
//! - [`FixedImages`] returns a fixed list of paths, or an I/O error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use super::welcome_service::{ConfigStore, ImageSource, StoreError};

#[derive(Default, Clone)]
pub(crate) struct MemoryStore {
    pending: HashMap<String, Value>,
    durable: Arc<Mutex<HashMap<String, Value>>>,
    pub(crate) fail_save: bool,
}

impl MemoryStore {
    pub(crate) fn with(entries: &[(&str, Value)]) -> Self {
        let map: HashMap<String, Value> = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Self {
            pending: map.clone(),
            durable: Arc::new(Mutex::new(map)),
            fail_save: false,
        }
    }

    /// Shared handle onto the durable copy; survives moving the store into
    /// the service.
    pub(crate) fn durable(&self) -> Arc<Mutex<HashMap<String, Value>>> {
        Arc::clone(&self.durable)
    }

    /// A fresh store holding only what was saved, as after a restart.
    pub(crate) fn reopen(durable: &Arc<Mutex<HashMap<String, Value>>>) -> Self {
        let map = durable.lock().unwrap().clone();
        Self {
            pending: map,
            durable: Arc::clone(durable),
            fail_save: false,
        }
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.pending.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        self.pending.insert(key.to_string(), value);
        Ok(())
    }

    fn save(&mut self) -> Result<(), StoreError> {
        if self.fail_save {
            return Err(StoreError::Save("injected failure".to_string()));
        }
        *self.durable.lock().unwrap() = self.pending.clone();
        Ok(())
    }
}

pub(crate) struct FixedImages {
    location: PathBuf,
    images: Option<Vec<PathBuf>>,
}

impl FixedImages {
    pub(crate) fn new(paths: &[&str]) -> Self {
        Self {
            location: PathBuf::from("/imgs"),
            images: Some(paths.iter().map(PathBuf::from).collect()),
        }
    }

    pub(crate) fn empty() -> Self {
        Self::new(&[])
    }

    /// Every listing fails, like an unreadable directory.
    pub(crate) fn failing() -> Self {
        Self {
            location: PathBuf::from("/imgs"),
            images: None,
        }
    }
}

impl ImageSource for FixedImages {
    fn location(&self) -> &Path {
        &self.location
    }

    fn list_images(&self) -> std::io::Result<Vec<PathBuf>> {
        match &self.images {
            Some(images) => Ok(images.clone()),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "injected failure",
            )),
        }
    }
}

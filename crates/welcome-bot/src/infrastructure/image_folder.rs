//! The welcome image folder on disk.
//!
//! The folder is created at startup if missing and resolved to an absolute
//! path once.  Listing happens on every call, so images dropped into the
//! folder while the bot runs are picked up immediately.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use welcome_core::domain::is_welcome_image;

use crate::application::ImageSource;

#[derive(Debug, Error)]
pub enum ImageFolderError {
    #[error("failed to create image folder {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to resolve image folder {path}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ImageFolder {
    path: PathBuf,
}

impl ImageFolder {
    /// Creates `path` (and its parents) if missing and returns the folder
    /// with its absolute path.
    ///
    /// # Errors
    ///
    /// Returns [`ImageFolderError`] when the directory cannot be created or
    /// resolved.  The bot refuses to start in that case.
    pub fn ensure(path: impl AsRef<Path>) -> Result<Self, ImageFolderError> {
        let path = path.as_ref();
        std::fs::create_dir_all(path).map_err(|source| ImageFolderError::Create {
            path: path.to_path_buf(),
            source,
        })?;
        let path = path
            .canonicalize()
            .map_err(|source| ImageFolderError::Resolve {
                path: path.to_path_buf(),
                source,
            })?;
        info!("welcome image folder: {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageSource for ImageFolder {
    fn location(&self) -> &Path {
        &self.path
    }

    fn list_images(&self) -> io::Result<Vec<PathBuf>> {
        let mut images = Vec::new();
        for entry in std::fs::read_dir(&self.path)? {
            let path = entry?.path();
            // Follows symlinks; a dangling link is skipped.
            if path.is_file() && is_welcome_image(&path) {
                images.push(path);
            }
        }
        images.sort();
        Ok(images)
    }
}

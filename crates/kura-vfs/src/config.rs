//! Store configuration.
//!
//! Loaded from RON files:
//!
//! ```ron
//! (
//!     root: "/var/lib/kura",
//!     read_only: false,
//!     store: (
//!         strict_segments: true,
//!         sniff_mime: true,
//!     ),
//! )
//! ```
//!
//! Every field is optional; missing fields take their defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::store::Store;
use crate::vfs::LocalBackend;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Behavior switches for a [`Store`](crate::Store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Validate segment-list paths with the same rules as string paths.
    pub strict_segments: bool,
    /// Read file contents to sniff a MIME type when the backend has none.
    pub sniff_mime: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            strict_segments: false,
            sniff_mime: true,
        }
    }
}

impl StoreConfig {
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }
}

/// Configuration for a store rooted in a host directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalStoreConfig {
    /// Host directory backing the store root.
    pub root: PathBuf,
    /// Reject every mutation.
    pub read_only: bool,
    pub store: StoreConfig,
}

impl Default for LocalStoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            read_only: false,
            store: StoreConfig::default(),
        }
    }
}

impl LocalStoreConfig {
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Load from a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&text)
    }

    /// Open a [`Store`] over a [`LocalBackend`] as configured.
    pub fn open(&self) -> Store {
        let mut backend = LocalBackend::new(self.root.clone());
        backend.set_read_only(self.read_only);
        Store::new(backend).with_config(self.store.clone())
    }
}

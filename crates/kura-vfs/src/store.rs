//! The path-addressed store.

use std::sync::Arc;

use crate::config::StoreConfig;
use crate::dir_ops::Dirs;
use crate::file_ops::Files;
use crate::listing::Lister;
use crate::mime::{InferSniffer, MimeSniffer};
use crate::navigator::Navigator;
use crate::path::{PathInput, VfsPath};
use crate::vfs::{StorageBackend, VfsResult};

/// File and directory operations over a [`StorageBackend`].
///
/// Operations are grouped as in `store.file().create(..)` and
/// `store.dir().list(..)`. Every call re-acquires the backend root; the
/// store holds no handles between calls.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn StorageBackend>,
    sniffer: Arc<dyn MimeSniffer>,
    config: StoreConfig,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("read_only", &self.backend.read_only())
            .field("config", &self.config)
            .finish()
    }
}

impl Store {
    /// Create a store with the default configuration and [`InferSniffer`].
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self::from_arc(Arc::new(backend))
    }

    /// Create a store over an already shared backend.
    pub fn from_arc(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            sniffer: Arc::new(InferSniffer),
            config: StoreConfig::default(),
        }
    }

    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the content classifier used when a backend reports no type.
    pub fn with_sniffer(mut self, sniffer: impl MimeSniffer + 'static) -> Self {
        self.sniffer = Arc::new(sniffer);
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// File operations.
    pub fn file(&self) -> Files<'_> {
        Files::new(self)
    }

    /// Directory operations.
    pub fn dir(&self) -> Dirs<'_> {
        Dirs::new(self)
    }

    pub(crate) fn normalize(&self, input: impl Into<PathInput>) -> VfsResult<VfsPath> {
        input.into().normalize(self.config.strict_segments)
    }

    pub(crate) fn navigator(&self) -> Navigator<'_> {
        Navigator::new(self.backend.as_ref())
    }

    /// The sniffer, unless sniffing is switched off.
    pub(crate) fn sniffer(&self) -> Option<&dyn MimeSniffer> {
        self.config.sniff_mime.then_some(self.sniffer.as_ref())
    }

    pub(crate) fn lister(&self) -> Lister<'_> {
        Lister::new(self.sniffer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mime::NoSniffer;
    use crate::vfs::MemoryBackend;

    #[test]
    fn test_sniffer_follows_config() {
        let store = Store::new(MemoryBackend::new());
        assert!(store.sniffer().is_some());

        let store = store.with_config(StoreConfig {
            sniff_mime: false,
            ..StoreConfig::default()
        });
        assert!(store.sniffer().is_none());
    }

    #[test]
    fn test_normalize_uses_strictness() {
        let loose = Store::new(MemoryBackend::new()).with_sniffer(NoSniffer);
        assert!(loose.normalize(["a/b"]).is_ok());

        let strict = loose.with_config(StoreConfig {
            strict_segments: true,
            ..StoreConfig::default()
        });
        assert!(strict.normalize(["a/b"]).is_err());
        assert!(strict.normalize("/a/b").is_ok());
    }
}

//! Storage engine implementation using fjall

use fjall::{Config, Keyspace, PersistMode};
use sessiongate_core::*;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub mod names;

pub use names::*;

/// Storage engine wrapping fjall keyspace
#[derive(Clone)]
pub struct StorageEngine {
    keyspace: Arc<Keyspace>,
}

impl StorageEngine {
    /// Create new storage engine at the given path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let keyspace = Arc::new(
            Config::new(path)
                .open()
                .map_err(|e| SessionGateError::Storage(e.to_string()))?,
        );

        info!(path = %path.display(), "Opened document store");
        Ok(StorageEngine { keyspace })
    }

    /// Create temporary storage engine for testing
    #[cfg(any(test, feature = "test-utils"))]
    pub fn temp() -> Result<(Self, tempfile::TempDir)> {
        let temp_dir = tempfile::tempdir()?;
        let engine = Self::new(temp_dir.path())?;
        Ok((engine, temp_dir))
    }

    /// Open the `names` collection
    pub fn names(&self) -> Result<NameStore> {
        NameStore::open(self.clone())
    }

    pub(crate) fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    /// Persist all changes to disk
    pub fn persist(&self) -> Result<()> {
        self.keyspace
            .persist(PersistMode::SyncAll)
            .map_err(|e| SessionGateError::Storage(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_engine_reopens_collection() {
        let (engine, _temp) = StorageEngine::temp().unwrap();
        engine.names().unwrap().insert("Bob").unwrap();

        assert_eq!(engine.names().unwrap().count().unwrap(), 1);
        engine.persist().unwrap();
    }
}

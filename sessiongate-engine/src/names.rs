//! The `names` collection
//!
//! Records are JSON documents keyed by their ULID, so a plain scan returns
//! them ordered by creation time (millisecond resolution).

use crate::StorageEngine;
use fjall::{Partition, PartitionCreateOptions};
use sessiongate_core::*;
use std::sync::Arc;
use tracing::{debug, info};

const PARTITION: &str = "names";

/// Handle on the `names` partition
#[derive(Clone)]
pub struct NameStore {
    partition: Arc<Partition>,
    engine: StorageEngine,
}

impl NameStore {
    pub(crate) fn open(engine: StorageEngine) -> Result<Self> {
        let partition = Arc::new(
            engine
                .keyspace()
                .open_partition(PARTITION, PartitionCreateOptions::default())
                .map_err(|e| SessionGateError::Storage(e.to_string()))?,
        );

        Ok(NameStore { partition, engine })
    }

    /// All records, oldest first
    pub fn list(&self) -> Result<Vec<NameRecord>> {
        let mut records = Vec::new();

        for item in self.partition.iter() {
            let (_key, value) = item.map_err(|e| SessionGateError::Storage(format!("Scan error: {}", e)))?;
            records.push(serde_json::from_slice(&value)?);
        }

        Ok(records)
    }

    /// Look up one record by id
    pub fn get(&self, id: &DocumentId) -> Result<Option<NameRecord>> {
        match self.partition.get(Self::key(id)) {
            Ok(Some(value)) => Ok(Some(serde_json::from_slice(&value)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(SessionGateError::Storage(e.to_string())),
        }
    }

    pub fn insert(&self, name: &str) -> Result<NameRecord> {
        let record = NameRecord::new(name)?;

        self.partition
            .insert(Self::key(&record.id), serde_json::to_vec(&record)?)
            .map_err(|e| SessionGateError::Storage(e.to_string()))?;
        self.engine.persist()?;

        debug!(id = %record.id, "Inserted name");
        Ok(record)
    }

    /// Insert several names in one atomic batch
    pub fn insert_many<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<NameRecord>> {
        self.replace(false, names)
    }

    pub fn remove(&self, id: &DocumentId) -> Result<()> {
        self.partition
            .remove(Self::key(id))
            .map_err(|e| SessionGateError::Storage(e.to_string()))?;
        self.engine.persist()
    }

    /// Delete every record; returns how many were removed
    pub fn clear(&self) -> Result<usize> {
        let keys = self.keys()?;
        let mut batch = self.engine.keyspace().batch();
        for key in &keys {
            batch.remove(&self.partition, key.as_slice());
        }
        batch
            .commit()
            .map_err(|e| SessionGateError::Storage(e.to_string()))?;
        self.engine.persist()?;

        Ok(keys.len())
    }

    /// Replace the collection with `names`, atomically
    pub fn seed<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<NameRecord>> {
        let records = self.replace(true, names)?;
        info!(count = records.len(), "Seeded names collection");
        Ok(records)
    }

    pub fn count(&self) -> Result<usize> {
        self.partition
            .len()
            .map_err(|e| SessionGateError::Storage(e.to_string()))
    }

    fn replace<S: AsRef<str>>(&self, clear: bool, names: &[S]) -> Result<Vec<NameRecord>> {
        let records = names
            .iter()
            .map(|name| NameRecord::new(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let mut batch = self.engine.keyspace().batch();
        if clear {
            for key in self.keys()? {
                batch.remove(&self.partition, key);
            }
        }
        for record in &records {
            batch.insert(&self.partition, Self::key(&record.id), serde_json::to_vec(record)?);
        }
        batch
            .commit()
            .map_err(|e| SessionGateError::Storage(e.to_string()))?;
        self.engine.persist()?;

        Ok(records)
    }

    fn keys(&self) -> Result<Vec<Vec<u8>>> {
        self.partition
            .iter()
            .map(|item| {
                item.map(|(key, _value)| key.to_vec())
                    .map_err(|e| SessionGateError::Storage(format!("Scan error: {}", e)))
            })
            .collect()
    }

    fn key(id: &DocumentId) -> Vec<u8> {
        id.to_string().into_bytes()
    }
}

//! Test utilities: an in-memory StorageBackend for unit tests.
//!
//! `InMemoryBackend` keeps one ordered map per partition so `scan`
//! behaves like the RocksDB backend (lexicographic key order). It is
//! intended for tests only; nothing persists.

use crate::storage_trait::{
    KvIterator, Operation, Partition, Result, StorageBackend, StorageError,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

type PartitionData = BTreeMap<Vec<u8>, Vec<u8>>;

/// In-memory storage backend backed by a map of BTreeMaps.
#[derive(Default)]
pub struct InMemoryBackend {
    partitions: RwLock<HashMap<String, PartitionData>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored in a partition. Test helper.
    pub fn len(&self, partition: &Partition) -> usize {
        self.partitions
            .read()
            .map(|p| p.get(partition.name()).map_or(0, |d| d.len()))
            .unwrap_or(0)
    }

    /// True if the partition holds no keys. Test helper.
    pub fn is_empty(&self, partition: &Partition) -> bool {
        self.len(partition) == 0
    }
}

impl StorageBackend for InMemoryBackend {
    fn get(&self, partition: &Partition, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let partitions = self
            .partitions
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        let data = partitions
            .get(partition.name())
            .ok_or_else(|| StorageError::PartitionNotFound(partition.name().to_string()))?;
        Ok(data.get(key).cloned())
    }

    fn put(&self, partition: &Partition, key: &[u8], value: &[u8]) -> Result<()> {
        let mut partitions = self
            .partitions
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        let data = partitions
            .get_mut(partition.name())
            .ok_or_else(|| StorageError::PartitionNotFound(partition.name().to_string()))?;
        data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn insert(&self, partition: &Partition, key: &[u8], value: &[u8]) -> Result<()> {
        let mut partitions = self
            .partitions
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        let data = partitions
            .get_mut(partition.name())
            .ok_or_else(|| StorageError::PartitionNotFound(partition.name().to_string()))?;
        if data.contains_key(key) {
            return Err(StorageError::UniqueConstraintViolation(format!(
                "key already exists in partition {}",
                partition
            )));
        }
        data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, partition: &Partition, key: &[u8]) -> Result<()> {
        let mut partitions = self
            .partitions
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        let data = partitions
            .get_mut(partition.name())
            .ok_or_else(|| StorageError::PartitionNotFound(partition.name().to_string()))?;
        data.remove(key);
        Ok(())
    }

    fn batch(&self, operations: Vec<Operation>) -> Result<()> {
        let mut partitions = self
            .partitions
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;

        // Validate every target partition before mutating anything so the
        // batch stays all-or-nothing
        for op in &operations {
            let name = match op {
                Operation::Put { partition, .. } => partition.name(),
                Operation::Delete { partition, .. } => partition.name(),
            };
            if !partitions.contains_key(name) {
                return Err(StorageError::PartitionNotFound(name.to_string()));
            }
        }

        for op in operations {
            match op {
                Operation::Put {
                    partition,
                    key,
                    value,
                } => {
                    if let Some(data) = partitions.get_mut(partition.name()) {
                        data.insert(key, value);
                    }
                }
                Operation::Delete { partition, key } => {
                    if let Some(data) = partitions.get_mut(partition.name()) {
                        data.remove(&key);
                    }
                }
            }
        }
        Ok(())
    }

    fn scan(
        &self,
        partition: &Partition,
        prefix: Option<&[u8]>,
        limit: Option<usize>,
    ) -> Result<KvIterator<'_>> {
        let partitions = self
            .partitions
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        let data = partitions
            .get(partition.name())
            .ok_or_else(|| StorageError::PartitionNotFound(partition.name().to_string()))?;

        let prefix = prefix.map(|p| p.to_vec());
        let mut results: Vec<(Vec<u8>, Vec<u8>)> = data
            .iter()
            .filter(|(k, _)| prefix.as_ref().map_or(true, |p| k.starts_with(p)))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(limit) = limit {
            results.truncate(limit);
        }
        Ok(Box::new(results.into_iter()))
    }

    fn partition_exists(&self, partition: &Partition) -> bool {
        self.partitions
            .read()
            .map(|p| p.contains_key(partition.name()))
            .unwrap_or(false)
    }

    fn create_partition(&self, partition: &Partition) -> Result<()> {
        let mut partitions = self
            .partitions
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        partitions.entry(partition.name().to_string()).or_default();
        Ok(())
    }

    fn list_partitions(&self) -> Result<Vec<Partition>> {
        let partitions = self
            .partitions
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        Ok(partitions.keys().map(Partition::new).collect())
    }

    fn drop_partition(&self, partition: &Partition) -> Result<()> {
        let mut partitions = self
            .partitions
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        partitions.remove(partition.name());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_delete() {
        let backend = InMemoryBackend::new();
        let partition = Partition::new("p1");
        backend.create_partition(&partition).unwrap();

        backend.put(&partition, b"k", b"v").unwrap();
        assert_eq!(backend.get(&partition, b"k").unwrap(), Some(b"v".to_vec()));

        backend.delete(&partition, b"k").unwrap();
        assert_eq!(backend.get(&partition, b"k").unwrap(), None);
    }

    #[test]
    fn test_insert_rejects_duplicate() {
        let backend = InMemoryBackend::new();
        let partition = Partition::new("p1");
        backend.create_partition(&partition).unwrap();

        backend.insert(&partition, b"k", b"v1").unwrap();
        let err = backend.insert(&partition, b"k", b"v2").unwrap_err();
        assert!(matches!(err, StorageError::UniqueConstraintViolation(_)));
        assert_eq!(backend.get(&partition, b"k").unwrap(), Some(b"v1".to_vec()));
    }

    #[test]
    fn test_missing_partition_errors() {
        let backend = InMemoryBackend::new();
        let partition = Partition::new("nope");

        let err = backend.get(&partition, b"k").unwrap_err();
        assert!(matches!(err, StorageError::PartitionNotFound(_)));
    }

    #[test]
    fn test_scan_is_ordered_and_prefix_filtered() {
        let backend = InMemoryBackend::new();
        let partition = Partition::new("p1");
        backend.create_partition(&partition).unwrap();

        backend.put(&partition, b"b:2", b"").unwrap();
        backend.put(&partition, b"a:1", b"").unwrap();
        backend.put(&partition, b"b:1", b"").unwrap();

        let keys: Vec<Vec<u8>> = backend
            .scan(&partition, Some(b"b:"), None)
            .unwrap()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec![b"b:1".to_vec(), b"b:2".to_vec()]);
    }

    #[test]
    fn test_batch_rejects_unknown_partition() {
        let backend = InMemoryBackend::new();
        let good = Partition::new("good");
        backend.create_partition(&good).unwrap();

        let ops = vec![
            Operation::Put {
                partition: good.clone(),
                key: b"k".to_vec(),
                value: b"v".to_vec(),
            },
            Operation::Delete {
                partition: Partition::new("missing"),
                key: b"k".to_vec(),
            },
        ];

        assert!(backend.batch(ops).is_err());
        // Nothing applied
        assert_eq!(backend.get(&good, b"k").unwrap(), None);
    }
}

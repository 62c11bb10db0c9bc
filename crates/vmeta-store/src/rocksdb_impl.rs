//! RocksDB implementation of the StorageBackend trait.
//!
//! Maps the generic partition concept to RocksDB column families. The
//! multi-threaded DB mode is used so column families can be created and
//! dropped through a shared handle.

use crate::storage_trait::{
    KvIterator, Operation, Partition, Result, StorageBackend, StorageError,
};
use log::info;
use rocksdb::{DBWithThreadMode, IteratorMode, MultiThreaded, Options};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::RwLock;

type Db = DBWithThreadMode<MultiThreaded>;

/// RocksDB implementation of the StorageBackend trait.
///
/// Each partition is a column family. Existing column families are
/// reattached on open, so a reopened database sees all partitions created
/// in earlier sessions.
pub struct RocksDbBackend {
    db: Db,
    // cf_handle() cannot enumerate families, so names are tracked here
    cf_names: RwLock<BTreeSet<String>>,
}

impl RocksDbBackend {
    /// Opens (or creates) a database at the given path, reattaching all
    /// existing column families.
    pub fn open(path: &Path) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let existing = Db::list_cf(&opts, path).unwrap_or_else(|_| vec!["default".to_string()]);
        let db = Db::open_cf(&opts, path, &existing)
            .map_err(|e| StorageError::IoError(e.to_string()))?;
        info!(
            "opened rocksdb at {} with {} column families",
            path.display(),
            existing.len()
        );

        Ok(Self {
            db,
            cf_names: RwLock::new(existing.into_iter().collect()),
        })
    }

    fn cf(&self, partition: &Partition) -> Result<std::sync::Arc<rocksdb::BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(partition.name())
            .ok_or_else(|| StorageError::PartitionNotFound(partition.name().to_string()))
    }
}

impl StorageBackend for RocksDbBackend {
    fn get(&self, partition: &Partition, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self.cf(partition)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StorageError::IoError(e.to_string()))
    }

    fn put(&self, partition: &Partition, key: &[u8], value: &[u8]) -> Result<()> {
        let cf = self.cf(partition)?;
        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StorageError::IoError(e.to_string()))
    }

    fn delete(&self, partition: &Partition, key: &[u8]) -> Result<()> {
        let cf = self.cf(partition)?;
        self.db
            .delete_cf(&cf, key)
            .map_err(|e| StorageError::IoError(e.to_string()))
    }

    fn batch(&self, operations: Vec<Operation>) -> Result<()> {
        use rocksdb::WriteBatch;

        let mut batch = WriteBatch::default();

        for op in operations {
            match op {
                Operation::Put {
                    partition,
                    key,
                    value,
                } => {
                    let cf = self.cf(&partition)?;
                    batch.put_cf(&cf, key, value);
                }
                Operation::Delete { partition, key } => {
                    let cf = self.cf(&partition)?;
                    batch.delete_cf(&cf, key);
                }
            }
        }

        self.db
            .write(batch)
            .map_err(|e| StorageError::IoError(e.to_string()))
    }

    fn scan(
        &self,
        partition: &Partition,
        prefix: Option<&[u8]>,
        limit: Option<usize>,
    ) -> Result<KvIterator<'_>> {
        use rocksdb::Direction;

        let cf = self.cf(partition)?;

        // Consistent snapshot for the duration of the iterator
        let snapshot = self.db.snapshot();

        let prefix_vec = prefix.map(|p| p.to_vec());

        let iter_mode = if let Some(p) = &prefix_vec {
            IteratorMode::From(p.as_slice(), Direction::Forward)
        } else {
            IteratorMode::Start
        };

        let mut readopts = rocksdb::ReadOptions::default();
        readopts.set_snapshot(&snapshot);
        let inner = self.db.iterator_cf_opt(&cf, readopts, iter_mode);

        struct SnapshotScanIter<'a> {
            // Held to keep the snapshot alive for 'a
            _snapshot: rocksdb::SnapshotWithThreadMode<'a, Db>,
            inner: rocksdb::DBIteratorWithThreadMode<'a, Db>,
            prefix: Option<Vec<u8>>,
            remaining: Option<usize>,
        }

        impl<'a> Iterator for SnapshotScanIter<'a> {
            type Item = (Vec<u8>, Vec<u8>);
            fn next(&mut self) -> Option<Self::Item> {
                if let Some(0) = self.remaining {
                    return None;
                }

                match self.inner.next()? {
                    Ok((k, v)) => {
                        if let Some(ref p) = self.prefix {
                            if !k.starts_with(p) {
                                return None;
                            }
                        }
                        if let Some(ref mut left) = self.remaining {
                            if *left > 0 {
                                *left -= 1;
                            }
                        }
                        Some((k.to_vec(), v.to_vec()))
                    }
                    Err(_) => None,
                }
            }
        }

        Ok(Box::new(SnapshotScanIter {
            _snapshot: snapshot,
            inner,
            prefix: prefix_vec,
            remaining: limit,
        }))
    }

    fn partition_exists(&self, partition: &Partition) -> bool {
        self.db.cf_handle(partition.name()).is_some()
    }

    fn create_partition(&self, partition: &Partition) -> Result<()> {
        if self.partition_exists(partition) {
            return Ok(());
        }

        let opts = Options::default();
        if let Err(e) = self.db.create_cf(partition.name(), &opts) {
            let msg = e.to_string();
            // Benign race: another thread created the CF between the
            // exists-check and the create
            if !msg.to_lowercase().contains("column family already exists") {
                return Err(StorageError::IoError(msg));
            }
        }

        self.cf_names
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?
            .insert(partition.name().to_string());

        Ok(())
    }

    fn list_partitions(&self) -> Result<Vec<Partition>> {
        let names = self
            .cf_names
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        Ok(names
            .iter()
            .filter(|n| n.as_str() != "default")
            .map(Partition::new)
            .collect())
    }

    fn drop_partition(&self, partition: &Partition) -> Result<()> {
        if !self.partition_exists(partition) {
            return Ok(());
        }

        self.db
            .drop_cf(partition.name())
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        self.cf_names
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?
            .remove(partition.name());

        Ok(())
    }
}

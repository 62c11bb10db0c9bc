//! Storage backend abstraction for pluggable key-value engines.
//!
//! The metadata layer never talks to a storage engine directly; everything
//! goes through the `StorageBackend` trait so the same code runs against
//! RocksDB in production and an in-memory map in tests.
//!
//! ## Partition model
//!
//! Each physical metadata table (the entry table, the schema table, the
//! secondary indexes) lives in its own partition. Backends map partitions
//! to their native concept:
//! - **RocksDB**: Column Family
//! - **In-memory**: BTreeMap namespace
//!
//! ## Atomicity
//!
//! Every single `insert`/`put`/`delete` call is atomic on its own, and a
//! `batch` is atomic as a whole. There is no multi-call transaction
//! primitive: callers that write several partitions in sequence own the
//! consistency story themselves (the metadata layer serializes those
//! sequences under one exclusive lock).

use std::fmt;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Clone)]
pub enum StorageError {
    /// Partition (column family, namespace) not found
    PartitionNotFound(String),

    /// Generic I/O error from the underlying engine
    IoError(String),

    /// Serialization/deserialization error
    SerializationError(String),

    /// Duplicate key rejected by `insert`
    UniqueConstraintViolation(String),

    /// Lock poisoning error (internal concurrency issue)
    LockPoisoned(String),

    /// Other errors
    Other(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::PartitionNotFound(p) => write!(f, "Partition not found: {}", p),
            StorageError::IoError(msg) => write!(f, "I/O error: {}", msg),
            StorageError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            StorageError::UniqueConstraintViolation(msg) => {
                write!(f, "Unique constraint violation: {}", msg)
            }
            StorageError::LockPoisoned(msg) => write!(f, "Lock poisoned: {}", msg),
            StorageError::Other(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// Represents a logical partition of data within a storage backend.
///
/// Partitions provide separate key namespaces. RocksDB maps them to
/// column families, the in-memory backend to per-partition maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Partition {
    name: String,
}

impl Partition {
    /// Creates a new partition with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the partition name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<String> for Partition {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&str> for Partition {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A single operation in an atomic batch.
///
/// Used with `StorageBackend::batch()`.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Insert or update a key-value pair
    Put {
        partition: Partition,
        key: Vec<u8>,
        value: Vec<u8>,
    },

    /// Delete a key
    Delete { partition: Partition, key: Vec<u8> },
}

/// Iterator over (key, value) pairs produced by `scan`.
pub type KvIterator<'a> = Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a>;

/// Trait for pluggable storage backend implementations.
///
/// Implementations must be thread-safe (Send + Sync) to allow concurrent
/// access.
///
/// ## Error Handling
///
/// Implementations should:
/// - Return `PartitionNotFound` if the partition doesn't exist
/// - Return `UniqueConstraintViolation` when `insert` hits an existing key
/// - Return `IoError` for underlying engine failures
pub trait StorageBackend: Send + Sync {
    /// Retrieves a value by key from the specified partition.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    fn get(&self, partition: &Partition, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Stores a key-value pair in the specified partition.
    ///
    /// If the key already exists, its value is updated (upsert).
    fn put(&self, partition: &Partition, key: &[u8], value: &[u8]) -> Result<()>;

    /// Stores a key-value pair, failing if the key already exists.
    ///
    /// Returns `UniqueConstraintViolation` on a duplicate key. The default
    /// implementation is a read-then-write; backends with native
    /// conditional puts may override it.
    fn insert(&self, partition: &Partition, key: &[u8], value: &[u8]) -> Result<()> {
        if self.get(partition, key)?.is_some() {
            return Err(StorageError::UniqueConstraintViolation(format!(
                "key already exists in partition {}",
                partition
            )));
        }
        self.put(partition, key, value)
    }

    /// Deletes a key from the specified partition.
    ///
    /// Returns `Ok(())` even if the key doesn't exist (idempotent).
    fn delete(&self, partition: &Partition, key: &[u8]) -> Result<()>;

    /// Executes multiple operations atomically in a batch.
    ///
    /// Either all operations succeed or none are applied.
    fn batch(&self, operations: Vec<Operation>) -> Result<()>;

    /// Scans keys in a partition in lexicographic order.
    ///
    /// ## Parameters
    /// - `prefix`: If Some, only return keys starting with this prefix
    /// - `limit`: If Some, return at most this many entries
    fn scan(
        &self,
        partition: &Partition,
        prefix: Option<&[u8]>,
        limit: Option<usize>,
    ) -> Result<KvIterator<'_>>;

    /// Checks if a partition exists.
    fn partition_exists(&self, partition: &Partition) -> bool;

    /// Creates a new partition.
    ///
    /// Returns `Ok(())` if the partition already exists (idempotent).
    fn create_partition(&self, partition: &Partition) -> Result<()>;

    /// Lists all partitions in the storage backend.
    fn list_partitions(&self) -> Result<Vec<Partition>>;

    /// Deletes a partition and all its data.
    ///
    /// **Warning**: This is a destructive operation and cannot be undone.
    fn drop_partition(&self, partition: &Partition) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_creation() {
        let p1 = Partition::new("meta_entry");
        assert_eq!(p1.name(), "meta_entry");

        let p2 = Partition::from("meta_uid_idx");
        assert_eq!(p2.name(), "meta_uid_idx");
    }

    #[test]
    fn test_operation_construction() {
        let op = Operation::Put {
            partition: Partition::new("test"),
            key: b"key1".to_vec(),
            value: b"value1".to_vec(),
        };

        match op {
            Operation::Put {
                partition,
                key,
                value,
            } => {
                assert_eq!(partition.name(), "test");
                assert_eq!(key, b"key1");
                assert_eq!(value, b"value1");
            }
            _ => panic!("Wrong operation type"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = StorageError::PartitionNotFound("meta_entry".to_string());
        assert_eq!(err.to_string(), "Partition not found: meta_entry");

        let err = StorageError::IoError("disk full".to_string());
        assert_eq!(err.to_string(), "I/O error: disk full");
    }
}

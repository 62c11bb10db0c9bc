//! # vmeta-store
//!
//! Low-level key-value store abstraction for the table metadata layer.
//! This crate isolates all direct RocksDB interactions, allowing
//! vmeta-core to stay free of engine-specific code.
//!
//! ## Architecture
//!
//! ```text
//! vmeta-core (metadata logic)
//!     ↓
//! vmeta-store (K/V operations)
//!     ↓
//! RocksDB (storage engine)
//! ```
//!
//! Each physical metadata table maps to one [`Partition`] (a RocksDB
//! column family). Tests swap in [`test_utils::InMemoryBackend`].

pub mod rocksdb_impl;
pub mod storage_trait;
pub mod test_utils;

pub use rocksdb_impl::RocksDbBackend;
pub use storage_trait::{KvIterator, Operation, Partition, StorageBackend, StorageError};

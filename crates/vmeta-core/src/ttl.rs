//! TTL manager: tracks tables with a retention period.
//!
//! Owns the TTL index and whatever ordering structure the expiry sweeper
//! needs; the entry-application path only feeds it insert/update/remove
//! events. Feed failures are logged by the caller and never fail the
//! triggering operation.

use crate::codec;
use crate::error::Result;
use crate::index_set::{keys, MetaTable};
use std::sync::Arc;
use vmeta_commons::{TtlInfo, Uid};
use vmeta_store::StorageBackend;

pub trait TtlManager: Send + Sync {
    fn insert_or_update(&self, info: TtlInfo) -> Result<()>;

    fn remove(&self, uid: Uid) -> Result<()>;
}

/// Default TTL manager backed by the `meta_ttl_idx` partition.
pub struct TtlIndex {
    backend: Arc<dyn StorageBackend>,
}

impl TtlIndex {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn get(&self, uid: Uid) -> Result<Option<TtlInfo>> {
        let partition = MetaTable::TtlIdx.partition();
        match self.backend.get(&partition, &keys::uid(uid))? {
            Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
            None => Ok(None),
        }
    }
}

impl TtlManager for TtlIndex {
    fn insert_or_update(&self, info: TtlInfo) -> Result<()> {
        let partition = MetaTable::TtlIdx.partition();
        self.backend
            .put(&partition, &keys::uid(info.uid), &codec::encode(&info)?)?;
        Ok(())
    }

    fn remove(&self, uid: Uid) -> Result<()> {
        let partition = MetaTable::TtlIdx.partition();
        self.backend.delete(&partition, &keys::uid(uid))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmeta_store::test_utils::InMemoryBackend;

    fn ttl_index() -> TtlIndex {
        let backend = Arc::new(InMemoryBackend::new());
        backend
            .create_partition(&MetaTable::TtlIdx.partition())
            .unwrap();
        TtlIndex::new(backend)
    }

    #[test]
    fn test_insert_update_remove() {
        let ttl = ttl_index();

        ttl.insert_or_update(TtlInfo {
            uid: 100,
            ttl_days: 7,
            change_time_ms: 1_700_000_000_000,
        })
        .unwrap();
        assert_eq!(ttl.get(100).unwrap().unwrap().ttl_days, 7);

        ttl.insert_or_update(TtlInfo {
            uid: 100,
            ttl_days: 30,
            change_time_ms: 1_700_000_100_000,
        })
        .unwrap();
        assert_eq!(ttl.get(100).unwrap().unwrap().ttl_days, 30);

        ttl.remove(100).unwrap();
        assert!(ttl.get(100).unwrap().is_none());
    }

    #[test]
    fn test_remove_missing_is_idempotent() {
        let ttl = ttl_index();
        ttl.remove(999).unwrap();
    }
}

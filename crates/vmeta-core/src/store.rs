//! The metadata store façade.
//!
//! One `MetaStore` per vnode. Write entry points acquire the partition's
//! exclusive lock, run the matching handler sequence start-to-finish,
//! and log the outcome with full context (vgId, operation, version, uid,
//! name). Read-only lookups go to the cache or the uid index without
//! contending with writers.

use crate::cache::MetaCache;
use crate::codec;
use crate::error::{MetaError, Result};
use crate::grant::{AllowAll, GrantPolicy};
use crate::handler;
use crate::hooks::{DataCacheHook, NoopHook};
use crate::index_set::{self, keys, MetaTable};
use crate::stats::{MetaStats, StatsSnapshot};
use crate::ttl::{TtlIndex, TtlManager};
use log::{error, info};
use std::sync::{Arc, RwLock};
use vmeta_commons::{
    AddColumnReq, CreateChildTableReq, CreateNormalTableReq, CreateOutcome, CreateSuperTableReq,
    DropSuperTableReq, DropTableReq, MetaInfo, SchemaVersion, SchemaWrapper, TableEntry,
    TableMetaRsp, Uid, UidIdxVal, Version, VgId,
};
use vmeta_store::StorageBackend;

pub struct MetaStore {
    pub(crate) vgid: VgId,
    pub(crate) backend: Arc<dyn StorageBackend>,
    pub(crate) cache: MetaCache,
    pub(crate) ttl: Arc<dyn TtlManager>,
    pub(crate) grant: Arc<dyn GrantPolicy>,
    pub(crate) hook: Arc<dyn DataCacheHook>,
    pub(crate) stats: MetaStats,
    /// The partition's exclusive metadata lock. Every structural
    /// mutation runs start-to-finish under the write half.
    lock: RwLock<()>,
}

impl MetaStore {
    /// Opens the store over a backend, creating any missing partitions.
    pub fn open(vgid: VgId, backend: Arc<dyn StorageBackend>) -> Result<Self> {
        index_set::create_partitions(backend.as_ref())?;
        Ok(Self {
            vgid,
            ttl: Arc::new(TtlIndex::new(backend.clone())),
            backend,
            cache: MetaCache::new(),
            grant: Arc::new(AllowAll),
            hook: Arc::new(NoopHook),
            stats: MetaStats::new(),
            lock: RwLock::new(()),
        })
    }

    pub fn with_grant(mut self, grant: Arc<dyn GrantPolicy>) -> Self {
        self.grant = grant;
        self
    }

    pub fn with_hook(mut self, hook: Arc<dyn DataCacheHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn with_ttl(mut self, ttl: Arc<dyn TtlManager>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn vgid(&self) -> VgId {
        self.vgid
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    // ---- write path ----

    pub fn create_super_table(
        &self,
        version: Version,
        req: &CreateSuperTableReq,
    ) -> Result<CreateOutcome> {
        let _guard = self.wlock();
        let result = handler::handle_super_table_create(self, version, req);
        match &result {
            Ok(outcome) => info!(
                "vgId:{} create super table {} suid:{} version:{} existed:{}",
                self.vgid,
                req.name,
                req.suid,
                version,
                !outcome.is_created()
            ),
            Err(e) => error!(
                "vgId:{} create super table {} suid:{} version:{} failed since {}",
                self.vgid, req.name, req.suid, version, e
            ),
        }
        result
    }

    pub fn create_child_table(
        &self,
        version: Version,
        req: &CreateChildTableReq,
    ) -> Result<CreateOutcome> {
        let _guard = self.wlock();
        let result = handler::handle_child_table_create(self, version, req);
        match &result {
            Ok(outcome) => info!(
                "vgId:{} create child table {} uid:{} suid:{} version:{} existed:{}",
                self.vgid,
                req.name,
                req.uid,
                req.suid,
                version,
                !outcome.is_created()
            ),
            Err(e) => error!(
                "vgId:{} create child table {} uid:{} suid:{} version:{} failed since {}",
                self.vgid, req.name, req.uid, req.suid, version, e
            ),
        }
        result
    }

    pub fn create_normal_table(
        &self,
        version: Version,
        req: &CreateNormalTableReq,
    ) -> Result<CreateOutcome> {
        let _guard = self.wlock();
        let result = handler::handle_normal_table_create(self, version, req);
        match &result {
            Ok(outcome) => info!(
                "vgId:{} create table {} uid:{} version:{} existed:{}",
                self.vgid,
                req.name,
                req.uid,
                version,
                !outcome.is_created()
            ),
            Err(e) => error!(
                "vgId:{} create table {} uid:{} version:{} failed since {}",
                self.vgid, req.name, req.uid, version, e
            ),
        }
        result
    }

    /// Drops a normal or child table by name. Returns the dropped uid,
    /// or `None` when the table was absent and the request asked to
    /// ignore that.
    pub fn drop_table(&self, version: Version, req: &DropTableReq) -> Result<Option<Uid>> {
        let _guard = self.wlock();
        let result = handler::handle_table_drop(self, version, req);
        match &result {
            Ok(uid) => info!(
                "vgId:{} drop table {} version:{} uid:{:?}",
                self.vgid, req.name, version, uid
            ),
            Err(e) => error!(
                "vgId:{} drop table {} version:{} failed since {}",
                self.vgid, req.name, version, e
            ),
        }
        result
    }

    /// Drops a super table, cascading to its children. Returns every
    /// dropped uid, children first.
    pub fn drop_super_table(
        &self,
        version: Version,
        req: &DropSuperTableReq,
    ) -> Result<Vec<Uid>> {
        let _guard = self.wlock();
        let result = handler::handle_super_table_drop(self, version, req);
        match &result {
            Ok(uids) => info!(
                "vgId:{} drop super table {} suid:{} version:{} dropped {} tables",
                self.vgid,
                req.name,
                req.suid,
                version,
                uids.len()
            ),
            Err(e) => error!(
                "vgId:{} drop super table {} suid:{} version:{} failed since {}",
                self.vgid, req.name, req.suid, version, e
            ),
        }
        result
    }

    /// Adds a column to a normal table.
    pub fn add_column(&self, version: Version, req: &AddColumnReq) -> Result<TableMetaRsp> {
        let _guard = self.wlock();
        let result = handler::handle_add_column(self, version, req);
        match &result {
            Ok(rsp) => info!(
                "vgId:{} add column {} to {} version:{} sver:{}",
                self.vgid, req.col_name, req.table_name, version, rsp.schema_version
            ),
            Err(e) => error!(
                "vgId:{} add column {} to {} version:{} failed since {}",
                self.vgid, req.col_name, req.table_name, version, e
            ),
        }
        result
    }

    // ---- read path (no exclusive lock) ----

    /// Existence and type lookup: cache first, uid index second.
    pub fn get_info(&self, uid: Uid) -> Result<Option<MetaInfo>> {
        if let Some(info) = self.cache.get(uid) {
            return Ok(Some(info));
        }
        match self
            .backend
            .get(&MetaTable::UidIdx.partition(), &keys::uid(uid))?
        {
            Some(bytes) => {
                let val: UidIdxVal = codec::decode(&bytes)?;
                Ok(Some(val.to_info(uid)))
            }
            None => Ok(None),
        }
    }

    pub fn resolve_name(&self, name: &str) -> Result<Option<Uid>> {
        match self
            .backend
            .get(&MetaTable::NameIdx.partition(), &keys::name(name))?
        {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    MetaError::Internal(format!("malformed name index value for {}", name))
                })?;
                Ok(Some(Uid::from_be_bytes(raw)))
            }
            None => Ok(None),
        }
    }

    pub fn is_super_table(&self, uid: Uid) -> Result<bool> {
        Ok(self
            .backend
            .get(&MetaTable::SuidIdx.partition(), &keys::uid(uid))?
            .is_some())
    }

    /// Schema of a table at a specific schema version (time travel).
    pub fn schema_at(&self, uid: Uid, sver: SchemaVersion) -> Result<Option<SchemaWrapper>> {
        match self
            .backend
            .get(&MetaTable::Schema.partition(), &keys::schema(uid, sver))?
        {
            Some(bytes) => Ok(Some(codec::decode_schema(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Uids of every child of a super table, in uid order.
    pub fn children_of(&self, suid: Uid) -> Result<Vec<Uid>> {
        let iter = self.backend.scan(
            &MetaTable::ChildIdx.partition(),
            Some(&keys::child_prefix(suid)),
            None,
        )?;
        Ok(iter.filter_map(|(k, _)| keys::trailing_uid(&k)).collect())
    }

    /// Uids of children of `suid` carrying exactly this tag blob.
    pub fn children_by_tags(&self, suid: Uid, tags: &[u8]) -> Result<Vec<Uid>> {
        let iter = self.backend.scan(
            &MetaTable::TagIdx.partition(),
            Some(&keys::tag_prefix(suid, tags)),
            None,
        )?;
        Ok(iter.filter_map(|(k, _)| keys::trailing_uid(&k)).collect())
    }

    /// Fetches the latest entry for a uid the uid index knows about. A
    /// uid-index hit with no entry record indicates corruption.
    pub fn fetch_entry(&self, uid: Uid) -> Result<TableEntry> {
        let info = self
            .get_info(uid)?
            .ok_or_else(|| MetaError::NotFound(format!("uid:{}", uid)))?;
        let key = keys::entry(info.version, uid);
        let bytes = self
            .backend
            .get(&MetaTable::Entry.partition(), &key)?
            .ok_or_else(|| {
                MetaError::Internal(format!(
                    "entry missing for uid:{} version:{}",
                    uid, info.version
                ))
            })?;
        codec::decode_entry(&bytes)
    }

    fn wlock(&self) -> std::sync::RwLockWriteGuard<'_, ()> {
        self.lock.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::test_support::RecordingHook;
    use vmeta_commons::{ColumnDataType, ColumnSchema, EntryPayload};
    use vmeta_store::test_utils::InMemoryBackend;

    fn normal_req(name: &str, uid: Uid) -> CreateNormalTableReq {
        CreateNormalTableReq {
            name: name.to_string(),
            uid,
            schema_row: SchemaWrapper::new(
                1,
                vec![
                    ColumnSchema::new(1, "ts", ColumnDataType::Timestamp, 8),
                    ColumnSchema::new(2, "temp", ColumnDataType::Float, 4),
                ],
            ),
            btime_ms: 1_700_000_000_000,
            ttl_days: 3,
            comment: None,
            col_cmpr: None,
        }
    }

    #[test]
    fn test_hook_sees_create_and_drop() {
        let hook = Arc::new(RecordingHook::default());
        let store = MetaStore::open(1, Arc::new(InMemoryBackend::new()))
            .unwrap()
            .with_hook(hook.clone());

        store.create_normal_table(1, &normal_req("n1", 300)).unwrap();
        store
            .drop_table(
                2,
                &DropTableReq {
                    name: "n1".to_string(),
                    ignore_not_exists: false,
                },
            )
            .unwrap();

        assert_eq!(hook.created.lock().unwrap().as_slice(), &[(300, 0)]);
        assert_eq!(hook.dropped.lock().unwrap().as_slice(), &[(300, 0)]);
    }

    #[test]
    fn test_fetch_entry_returns_latest_record() {
        let store = MetaStore::open(1, Arc::new(InMemoryBackend::new())).unwrap();
        store.create_normal_table(7, &normal_req("n1", 300)).unwrap();

        let entry = store.fetch_entry(300).unwrap();
        assert_eq!(entry.version, 7);
        assert_eq!(entry.name, "n1");
        assert!(matches!(entry.payload, EntryPayload::Normal { .. }));

        assert!(matches!(
            store.fetch_entry(999),
            Err(MetaError::NotFound(_))
        ));
    }

    #[test]
    fn test_get_info_falls_back_to_uid_index_after_cache_eviction() {
        let store = MetaStore::open(1, Arc::new(InMemoryBackend::new())).unwrap();
        store.create_normal_table(1, &normal_req("n1", 300)).unwrap();

        store.cache.evict(300);
        let info = store.get_info(300).unwrap().unwrap();
        assert_eq!(info.uid, 300);
        assert_eq!(info.suid, 0);
    }
}

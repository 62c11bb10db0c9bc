//! Concrete index writers: one function per live cell of the dispatch
//! matrix.
//!
//! Every writer takes the store and the canonical entry being applied
//! and performs exactly one physical write, plus the cache/TTL side
//! effects tied to that write. The uid-index writers are the only code
//! allowed to touch the existence cache; the TTL writers are the only
//! feed into the TTL manager, and their failures are logged rather than
//! propagated.

use crate::codec;
use crate::error::{MetaError, Result};
use crate::index_set::{keys, MetaTable};
use crate::store::MetaStore;
use log::warn;
use vmeta_commons::{EntryPayload, TableEntry, TtlInfo, UidIdxVal};

pub(crate) type WriterFn = fn(&MetaStore, &TableEntry) -> Result<()>;

pub(crate) fn entry_insert(store: &MetaStore, entry: &TableEntry) -> Result<()> {
    let key = keys::entry(entry.version, entry.uid);
    store
        .backend
        .insert(&MetaTable::Entry.partition(), &key, &codec::encode_entry(entry)?)?;
    Ok(())
}

pub(crate) fn entry_delete(store: &MetaStore, entry: &TableEntry) -> Result<()> {
    let key = keys::entry(entry.version, entry.uid);
    store.backend.delete(&MetaTable::Entry.partition(), &key)?;
    Ok(())
}

pub(crate) fn schema_upsert(store: &MetaStore, entry: &TableEntry) -> Result<()> {
    let schema = match &entry.payload {
        EntryPayload::Super { schema_row, .. } => schema_row,
        EntryPayload::Normal { schema_row, .. } => schema_row,
        _ => {
            return Err(MetaError::Internal(format!(
                "schema write for schemaless entry uid:{}",
                entry.uid
            )))
        }
    };
    let key = keys::schema(entry.uid, schema.version);
    store
        .backend
        .put(&MetaTable::Schema.partition(), &key, &codec::encode_schema(schema)?)?;
    Ok(())
}

fn uid_idx_val(entry: &TableEntry) -> UidIdxVal {
    UidIdxVal {
        suid: entry.suid(),
        skm_ver: entry.schema_version(),
        version: entry.version,
    }
}

pub(crate) fn uid_idx_insert(store: &MetaStore, entry: &TableEntry) -> Result<()> {
    let val = uid_idx_val(entry);
    store.backend.insert(
        &MetaTable::UidIdx.partition(),
        &keys::uid(entry.uid),
        &codec::encode(&val)?,
    )?;
    store.cache.upsert(val.to_info(entry.uid));
    Ok(())
}

pub(crate) fn uid_idx_update(store: &MetaStore, entry: &TableEntry) -> Result<()> {
    let val = uid_idx_val(entry);
    store.backend.put(
        &MetaTable::UidIdx.partition(),
        &keys::uid(entry.uid),
        &codec::encode(&val)?,
    )?;
    store.cache.upsert(val.to_info(entry.uid));
    Ok(())
}

pub(crate) fn uid_idx_delete(store: &MetaStore, entry: &TableEntry) -> Result<()> {
    store
        .backend
        .delete(&MetaTable::UidIdx.partition(), &keys::uid(entry.uid))?;
    store.cache.evict(entry.uid);
    Ok(())
}

pub(crate) fn name_idx_insert(store: &MetaStore, entry: &TableEntry) -> Result<()> {
    store.backend.insert(
        &MetaTable::NameIdx.partition(),
        &keys::name(&entry.name),
        &entry.uid.to_be_bytes(),
    )?;
    Ok(())
}

pub(crate) fn name_idx_delete(store: &MetaStore, entry: &TableEntry) -> Result<()> {
    store
        .backend
        .delete(&MetaTable::NameIdx.partition(), &keys::name(&entry.name))?;
    Ok(())
}

pub(crate) fn suid_idx_insert(store: &MetaStore, entry: &TableEntry) -> Result<()> {
    store
        .backend
        .insert(&MetaTable::SuidIdx.partition(), &keys::uid(entry.uid), &[])?;
    Ok(())
}

pub(crate) fn suid_idx_delete(store: &MetaStore, entry: &TableEntry) -> Result<()> {
    store
        .backend
        .delete(&MetaTable::SuidIdx.partition(), &keys::uid(entry.uid))?;
    Ok(())
}

fn child_fields(entry: &TableEntry) -> Result<(i64, &[u8])> {
    match &entry.payload {
        EntryPayload::Child { suid, tags, .. } => Ok((*suid, tags.as_slice())),
        _ => Err(MetaError::Internal(format!(
            "child index write for non-child entry uid:{}",
            entry.uid
        ))),
    }
}

pub(crate) fn child_idx_insert(store: &MetaStore, entry: &TableEntry) -> Result<()> {
    let (suid, tags) = child_fields(entry)?;
    store.backend.insert(
        &MetaTable::ChildIdx.partition(),
        &keys::child(suid, entry.uid),
        tags,
    )?;
    Ok(())
}

pub(crate) fn child_idx_delete(store: &MetaStore, entry: &TableEntry) -> Result<()> {
    let (suid, _) = child_fields(entry)?;
    store
        .backend
        .delete(&MetaTable::ChildIdx.partition(), &keys::child(suid, entry.uid))?;
    Ok(())
}

pub(crate) fn tag_idx_insert(store: &MetaStore, entry: &TableEntry) -> Result<()> {
    let (suid, tags) = child_fields(entry)?;
    store.backend.insert(
        &MetaTable::TagIdx.partition(),
        &keys::tag(suid, tags, entry.uid),
        &[],
    )?;
    Ok(())
}

pub(crate) fn tag_idx_delete(store: &MetaStore, entry: &TableEntry) -> Result<()> {
    let (suid, tags) = child_fields(entry)?;
    store
        .backend
        .delete(&MetaTable::TagIdx.partition(), &keys::tag(suid, tags, entry.uid))?;
    Ok(())
}

fn btime_of(entry: &TableEntry) -> Result<i64> {
    entry.btime_ms().ok_or_else(|| {
        MetaError::Internal(format!("btime index write for uid:{} without btime", entry.uid))
    })
}

pub(crate) fn btime_idx_insert(store: &MetaStore, entry: &TableEntry) -> Result<()> {
    let btime = btime_of(entry)?;
    store.backend.insert(
        &MetaTable::BtimeIdx.partition(),
        &keys::btime(entry.uid, btime),
        &[],
    )?;
    Ok(())
}

pub(crate) fn btime_idx_delete(store: &MetaStore, entry: &TableEntry) -> Result<()> {
    let btime = btime_of(entry)?;
    store
        .backend
        .delete(&MetaTable::BtimeIdx.partition(), &keys::btime(entry.uid, btime))?;
    Ok(())
}

// TTL feed failures must not fail the table operation: the TTL index is
// a secondary mirror the expiry sweeper can rebuild.
pub(crate) fn ttl_idx_upsert(store: &MetaStore, entry: &TableEntry) -> Result<()> {
    let info = TtlInfo {
        uid: entry.uid,
        ttl_days: entry.ttl_days().unwrap_or(0),
        change_time_ms: entry.btime_ms().unwrap_or(0),
    };
    if let Err(e) = store.ttl.insert_or_update(info) {
        warn!(
            "vgId:{} ttl upsert failed for uid:{} since {}",
            store.vgid, entry.uid, e
        );
    }
    Ok(())
}

pub(crate) fn ttl_idx_remove(store: &MetaStore, entry: &TableEntry) -> Result<()> {
    if let Err(e) = store.ttl.remove(entry.uid) {
        warn!(
            "vgId:{} ttl remove failed for uid:{} since {}",
            store.vgid, entry.uid, e
        );
    }
    Ok(())
}

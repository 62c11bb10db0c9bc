//! Per-kind orchestration: validate, build the canonical entry, run the
//! ordered write sequence, then update stats and prime the data cache.
//!
//! Every function here runs inside the store's exclusive write lock.
//! Once a sequence starts writing there is no rollback: the first
//! failing step aborts the rest and the error is returned as-is, with
//! replay (guarded by the idempotence checks) as the recovery path.
//! Stats and hooks are touched only after the full sequence succeeded.

use crate::dispatch::{
    apply_ops, CHILD_TABLE_CREATE_OPS, CHILD_TABLE_DROP_OPS, NORMAL_TABLE_CREATE_OPS,
    NORMAL_TABLE_DROP_OPS, NORMAL_TABLE_UPDATE_OPS, SUPER_TABLE_CREATE_OPS, SUPER_TABLE_DROP_OPS,
    SUPER_TABLE_UPDATE_OPS,
};
use crate::error::{MetaError, Result};
use crate::grant::Grant;
use crate::store::MetaStore;
use crate::validators::{
    check_add_column, check_create_child_table, check_create_normal_table,
    check_create_super_table, check_drop_super_table, check_drop_table, CheckCreate,
};
use crate::writers;
use log::debug;
use vmeta_commons::{
    AddColumnReq, ColumnSchema, CreateChildTableReq, CreateNormalTableReq, CreateOutcome,
    CreateSuperTableReq, DropSuperTableReq, DropTableReq, EntryPayload, MetaInfo, SchemaWrapper,
    TableEntry, TableKind, TableMetaRsp, Uid, Version,
};

fn super_rsp(name: &str, uid: Uid, schema: Option<SchemaWrapper>, skm_ver: i32) -> TableMetaRsp {
    TableMetaRsp {
        name: name.to_string(),
        uid,
        suid: uid,
        kind: TableKind::Super,
        schema_version: skm_ver,
        schema_row: schema,
    }
}

fn build_super_entry(version: Version, req: &CreateSuperTableReq) -> TableEntry {
    TableEntry {
        version,
        uid: req.suid,
        name: req.name.clone(),
        flags: 0,
        payload: EntryPayload::Super {
            schema_row: req.schema_row.clone(),
            schema_tag: req.schema_tag.clone(),
            rollup: req.rollup.clone(),
        },
        col_cmpr: req.col_cmpr.clone(),
    }
}

pub(crate) fn handle_super_table_create(
    store: &MetaStore,
    version: Version,
    req: &CreateSuperTableReq,
) -> Result<CreateOutcome> {
    match check_create_super_table(store, req)? {
        CheckCreate::Proceed => {
            let entry = build_super_entry(version, req);
            apply_ops(store, &entry, SUPER_TABLE_CREATE_OPS)?;

            store.stats.add_super_tables(1);
            store
                .hook
                .table_created(entry.uid, entry.uid, Some(&req.schema_row));
            Ok(CreateOutcome::Created(super_rsp(
                &req.name,
                req.suid,
                Some(req.schema_row.clone()),
                req.schema_row.version,
            )))
        }
        CheckCreate::Existed(info) => {
            if req.schema_row.version > info.skm_ver {
                // Replayed create carrying a newer schema applies as an
                // in-place update
                if version <= info.version {
                    return Err(MetaError::InvalidRequest(format!(
                        "stale version:{}, stored:{}",
                        version, info.version
                    )));
                }
                let entry = build_super_entry(version, req);
                apply_ops(store, &entry, SUPER_TABLE_UPDATE_OPS)?;
                debug!(
                    "vgId:{} super table {} updated to schema version {}",
                    store.vgid, req.name, req.schema_row.version
                );
                return Ok(CreateOutcome::Existed(super_rsp(
                    &req.name,
                    info.uid,
                    Some(req.schema_row.clone()),
                    req.schema_row.version,
                )));
            }
            let schema = store.schema_at(info.uid, info.skm_ver)?;
            Ok(CreateOutcome::Existed(super_rsp(
                &req.name,
                info.uid,
                schema,
                info.skm_ver,
            )))
        }
    }
}

fn time_series_of(schema: Option<&SchemaWrapper>) -> i64 {
    // The primary timestamp column is not counted as a series
    schema.map_or(0, |s| (s.columns.len() as i64 - 1).max(0))
}

pub(crate) fn handle_child_table_create(
    store: &MetaStore,
    version: Version,
    req: &CreateChildTableReq,
) -> Result<CreateOutcome> {
    let parent_schema = |info: &MetaInfo| store.schema_at(info.uid, info.skm_ver);

    match check_create_child_table(store, req)? {
        CheckCreate::Existed(info) => {
            let parent = store.get_info(info.suid)?;
            let schema = match &parent {
                Some(p) => parent_schema(p)?,
                None => None,
            };
            Ok(CreateOutcome::Existed(TableMetaRsp {
                name: req.name.clone(),
                uid: info.uid,
                suid: info.suid,
                kind: TableKind::Child,
                schema_version: parent.map_or(0, |p| p.skm_ver),
                schema_row: schema,
            }))
        }
        CheckCreate::Proceed => {
            store.grant.check(Grant::TimeSeries)?;

            let parent = store.get_info(req.suid)?.ok_or_else(|| {
                MetaError::Internal(format!("super table suid:{} vanished", req.suid))
            })?;
            let schema = parent_schema(&parent)?;

            let entry = TableEntry {
                version,
                uid: req.uid,
                name: req.name.clone(),
                flags: 0,
                payload: EntryPayload::Child {
                    suid: req.suid,
                    tags: req.tags.clone(),
                    btime_ms: req.btime_ms,
                    ttl_days: req.ttl_days,
                    comment: req.comment.clone(),
                },
                col_cmpr: None,
            };
            apply_ops(store, &entry, CHILD_TABLE_CREATE_OPS)?;

            store.stats.add_child_tables(1);
            store.stats.add_time_series(time_series_of(schema.as_ref()));
            store.hook.table_created(req.uid, req.suid, schema.as_ref());
            Ok(CreateOutcome::Created(TableMetaRsp {
                name: req.name.clone(),
                uid: req.uid,
                suid: req.suid,
                kind: TableKind::Child,
                schema_version: parent.skm_ver,
                schema_row: schema,
            }))
        }
    }
}

pub(crate) fn handle_normal_table_create(
    store: &MetaStore,
    version: Version,
    req: &CreateNormalTableReq,
) -> Result<CreateOutcome> {
    match check_create_normal_table(store, req)? {
        CheckCreate::Existed(info) => {
            let schema = store.schema_at(info.uid, info.skm_ver)?;
            Ok(CreateOutcome::Existed(TableMetaRsp {
                name: req.name.clone(),
                uid: info.uid,
                suid: 0,
                kind: TableKind::Normal,
                schema_version: info.skm_ver,
                schema_row: schema,
            }))
        }
        CheckCreate::Proceed => {
            store.grant.check(Grant::TimeSeries)?;

            let entry = TableEntry {
                version,
                uid: req.uid,
                name: req.name.clone(),
                flags: 0,
                payload: EntryPayload::Normal {
                    schema_row: req.schema_row.clone(),
                    ncid: req.schema_row.max_col_id() + 1,
                    btime_ms: req.btime_ms,
                    ttl_days: req.ttl_days,
                    comment: req.comment.clone(),
                },
                col_cmpr: req.col_cmpr.clone(),
            };
            apply_ops(store, &entry, NORMAL_TABLE_CREATE_OPS)?;

            store.stats.add_normal_tables(1);
            store
                .stats
                .add_time_series(time_series_of(Some(&req.schema_row)));
            store.hook.table_created(req.uid, 0, Some(&req.schema_row));
            Ok(CreateOutcome::Created(TableMetaRsp {
                name: req.name.clone(),
                uid: req.uid,
                suid: 0,
                kind: TableKind::Normal,
                schema_version: req.schema_row.version,
                schema_row: Some(req.schema_row.clone()),
            }))
        }
    }
}

/// Deletes one table's index rows and appends its tombstone. The caller
/// has already validated and version-guarded the drop.
fn drop_one(store: &MetaStore, version: Version, entry: &TableEntry) -> Result<()> {
    let kind = entry.kind();
    let ops = match kind {
        TableKind::Normal => NORMAL_TABLE_DROP_OPS,
        TableKind::Child => CHILD_TABLE_DROP_OPS,
        TableKind::Super => SUPER_TABLE_DROP_OPS,
    };
    apply_ops(store, entry, ops)?;

    let tombstone = TableEntry {
        version,
        uid: entry.uid,
        name: entry.name.clone(),
        flags: entry.flags,
        payload: EntryPayload::Dropped(kind),
        col_cmpr: None,
    };
    writers::entry_insert(store, &tombstone)?;

    match kind {
        TableKind::Normal => {
            store.stats.add_normal_tables(-1);
            if let EntryPayload::Normal { schema_row, .. } = &entry.payload {
                store.stats.add_time_series(-time_series_of(Some(schema_row)));
            }
        }
        TableKind::Child => {
            store.stats.add_child_tables(-1);
            if let Some(parent) = store.get_info(entry.suid())? {
                let schema = store.schema_at(parent.uid, parent.skm_ver)?;
                store.stats.add_time_series(-time_series_of(schema.as_ref()));
            }
        }
        TableKind::Super => {
            store.stats.add_super_tables(-1);
        }
    }
    store.hook.table_dropped(entry.uid, entry.suid());
    Ok(())
}

pub(crate) fn handle_table_drop(
    store: &MetaStore,
    version: Version,
    req: &DropTableReq,
) -> Result<Option<Uid>> {
    let info = match check_drop_table(store, req)? {
        Some(info) => info,
        None => {
            debug!(
                "vgId:{} drop table {} ignored, not found",
                store.vgid, req.name
            );
            return Ok(None);
        }
    };
    if version <= info.version {
        return Err(MetaError::InvalidRequest(format!(
            "stale version:{}, stored:{}",
            version, info.version
        )));
    }

    let entry = store.fetch_entry(info.uid)?;
    drop_one(store, version, &entry)?;
    Ok(Some(info.uid))
}

/// Drops a super table and cascades to its children, children first so
/// no child ever outlives its parent.
pub(crate) fn handle_super_table_drop(
    store: &MetaStore,
    version: Version,
    req: &DropSuperTableReq,
) -> Result<Vec<Uid>> {
    let info = check_drop_super_table(store, req)?;
    if version <= info.version {
        return Err(MetaError::InvalidRequest(format!(
            "stale version:{}, stored:{}",
            version, info.version
        )));
    }

    let mut dropped = Vec::new();
    for child_uid in store.children_of(info.uid)? {
        let entry = store.fetch_entry(child_uid)?;
        drop_one(store, version, &entry)?;
        dropped.push(child_uid);
    }

    let entry = store.fetch_entry(info.uid)?;
    drop_one(store, version, &entry)?;
    dropped.push(info.uid);
    Ok(dropped)
}

pub(crate) fn handle_add_column(
    store: &MetaStore,
    version: Version,
    req: &AddColumnReq,
) -> Result<TableMetaRsp> {
    store.grant.check(Grant::TimeSeries)?;

    let mut entry = check_add_column(store, version, req)?;
    let schema_version;
    match &mut entry.payload {
        EntryPayload::Normal {
            schema_row, ncid, ..
        } => {
            let col = ColumnSchema {
                col_id: *ncid,
                name: req.col_name.clone(),
                data_type: req.data_type,
                bytes: req.bytes,
                flags: req.flags,
            };
            schema_row.columns.push(col);
            schema_row.version += 1;
            schema_version = schema_row.version;
            *ncid += 1;
        }
        _ => {
            return Err(MetaError::Internal(format!(
                "add column on non-normal entry uid:{}",
                entry.uid
            )))
        }
    }
    entry.version = version;

    apply_ops(store, &entry, NORMAL_TABLE_UPDATE_OPS)?;
    store.stats.add_time_series(1);

    let schema_row = match &entry.payload {
        EntryPayload::Normal { schema_row, .. } => Some(schema_row.clone()),
        _ => None,
    };
    Ok(TableMetaRsp {
        name: req.table_name.clone(),
        uid: entry.uid,
        suid: 0,
        kind: TableKind::Normal,
        schema_version,
        schema_row,
    })
}

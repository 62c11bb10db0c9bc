//! Pre-commit request validation.
//!
//! Every check runs before any index is touched and performs reads
//! only; a rejection here guarantees the partition state is untouched.
//! A name that resolves to a uid the uid index does not know indicates
//! prior corruption and is promoted to `Internal` rather than reported
//! as not-found.

use crate::error::{MetaError, Result};
use crate::store::MetaStore;
use vmeta_commons::{
    AddColumnReq, CreateChildTableReq, CreateNormalTableReq, CreateSuperTableReq,
    DropSuperTableReq, DropTableReq, EntryPayload, MetaInfo, TableEntry, Uid, Version,
};
use vmeta_commons::models::schema::MAX_BYTES_PER_ROW;

/// Outcome of a create-path check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CheckCreate {
    /// No conflict: proceed to the write sequence
    Proceed,
    /// The identical table already exists (idempotent replay)
    Existed(MetaInfo),
}

fn lookup_info(store: &MetaStore, uid: Uid, name: &str) -> Result<MetaInfo> {
    store.get_info(uid)?.ok_or_else(|| {
        MetaError::Internal(format!(
            "name index resolves {} to uid:{} unknown to the uid index",
            name, uid
        ))
    })
}

pub(crate) fn check_create_super_table(
    store: &MetaStore,
    req: &CreateSuperTableReq,
) -> Result<CheckCreate> {
    if req.name.is_empty() {
        return Err(MetaError::InvalidRequest("empty table name".to_string()));
    }
    if req.suid <= 0 {
        return Err(MetaError::InvalidRequest(format!(
            "invalid suid:{}",
            req.suid
        )));
    }

    match store.resolve_name(&req.name)? {
        None => Ok(CheckCreate::Proceed),
        Some(uid) => {
            if uid != req.suid {
                return Err(MetaError::AlreadyExists {
                    name: req.name.clone(),
                    uid,
                });
            }
            let info = lookup_info(store, uid, &req.name)?;
            if info.suid != info.uid {
                // Same uid somehow held by a non-super table
                return Err(MetaError::AlreadyExists {
                    name: req.name.clone(),
                    uid,
                });
            }
            Ok(CheckCreate::Existed(info))
        }
    }
}

pub(crate) fn check_create_child_table(
    store: &MetaStore,
    req: &CreateChildTableReq,
) -> Result<CheckCreate> {
    if req.name.is_empty() {
        return Err(MetaError::InvalidRequest("empty table name".to_string()));
    }
    if req.parent_name.is_empty() {
        return Err(MetaError::InvalidRequest(
            "empty super table name".to_string(),
        ));
    }
    if req.uid <= 0 || req.suid <= 0 || req.uid == req.suid {
        return Err(MetaError::InvalidRequest(format!(
            "invalid uid:{} suid:{}",
            req.uid, req.suid
        )));
    }

    if let Some(uid) = store.resolve_name(&req.name)? {
        if uid != req.uid {
            return Err(MetaError::AlreadyExists {
                name: req.name.clone(),
                uid,
            });
        }
        let info = lookup_info(store, uid, &req.name)?;
        if info.suid != req.suid {
            return Err(MetaError::AlreadyExists {
                name: req.name.clone(),
                uid,
            });
        }
        return Ok(CheckCreate::Existed(info));
    }

    // The parent name must resolve to the requested suid
    match store.resolve_name(&req.parent_name)? {
        None => {
            return Err(MetaError::NotFound(format!(
                "super table {}",
                req.parent_name
            )))
        }
        Some(resolved) if resolved != req.suid => {
            return Err(MetaError::NotFound(format!(
                "super table {} has uid:{}, not suid:{}",
                req.parent_name, resolved, req.suid
            )))
        }
        Some(_) => {}
    }

    // Name resolved, so a uid-index miss is corruption; the parent must
    // also be a super table
    let parent = lookup_info(store, req.suid, &req.parent_name)?;
    if parent.suid != parent.uid {
        return Err(MetaError::InvalidRequest(format!(
            "suid:{} is not a super table",
            req.suid
        )));
    }

    Ok(CheckCreate::Proceed)
}

pub(crate) fn check_create_normal_table(
    store: &MetaStore,
    req: &CreateNormalTableReq,
) -> Result<CheckCreate> {
    if req.name.is_empty() {
        return Err(MetaError::InvalidRequest("empty table name".to_string()));
    }
    if req.uid <= 0 {
        return Err(MetaError::InvalidRequest(format!("invalid uid:{}", req.uid)));
    }

    match store.resolve_name(&req.name)? {
        None => Ok(CheckCreate::Proceed),
        Some(uid) if uid == req.uid => {
            let info = lookup_info(store, uid, &req.name)?;
            Ok(CheckCreate::Existed(info))
        }
        // Carries the existing uid so create-if-absent callers can
        // resolve the winner without a second lookup
        Some(uid) => Err(MetaError::AlreadyExists {
            name: req.name.clone(),
            uid,
        }),
    }
}

/// Validates a normal/child drop. `Ok(None)` means the table is absent
/// and the request asked to ignore that.
pub(crate) fn check_drop_table(
    store: &MetaStore,
    req: &DropTableReq,
) -> Result<Option<MetaInfo>> {
    if req.name.is_empty() {
        return Err(MetaError::InvalidRequest("empty table name".to_string()));
    }

    let uid = match store.resolve_name(&req.name)? {
        Some(uid) => uid,
        None if req.ignore_not_exists => return Ok(None),
        None => return Err(MetaError::NotFound(format!("table {}", req.name))),
    };

    let info = lookup_info(store, uid, &req.name)?;
    if info.suid == info.uid {
        return Err(MetaError::InvalidRequest(format!(
            "{} is a super table, use drop super table",
            req.name
        )));
    }
    Ok(Some(info))
}

pub(crate) fn check_drop_super_table(
    store: &MetaStore,
    req: &DropSuperTableReq,
) -> Result<MetaInfo> {
    if req.name.is_empty() {
        return Err(MetaError::InvalidRequest("empty table name".to_string()));
    }

    let uid = store
        .resolve_name(&req.name)?
        .ok_or_else(|| MetaError::NotFound(format!("super table {}", req.name)))?;
    if uid != req.suid {
        return Err(MetaError::InvalidRequest(format!(
            "{} resolves to uid:{}, not suid:{}",
            req.name, uid, req.suid
        )));
    }

    let info = lookup_info(store, uid, &req.name)?;
    if info.suid != info.uid {
        return Err(MetaError::InvalidRequest(format!(
            "{} is not a super table",
            req.name
        )));
    }
    Ok(info)
}

/// Validates AddColumn and returns the table's current entry for the
/// handler to mutate.
pub(crate) fn check_add_column(
    store: &MetaStore,
    version: Version,
    req: &AddColumnReq,
) -> Result<TableEntry> {
    if req.table_name.is_empty() {
        return Err(MetaError::InvalidRequest("empty table name".to_string()));
    }
    if req.col_name.is_empty() {
        return Err(MetaError::InvalidRequest("empty column name".to_string()));
    }
    if req.bytes <= 0 {
        return Err(MetaError::InvalidRequest(format!(
            "invalid column width:{}",
            req.bytes
        )));
    }

    let uid = store
        .resolve_name(&req.table_name)?
        .ok_or_else(|| MetaError::NotFound(format!("table {}", req.table_name)))?;
    let info = lookup_info(store, uid, &req.table_name)?;
    if info.suid != 0 {
        return Err(MetaError::InvalidRequest(format!(
            "{} is not a normal table",
            req.table_name
        )));
    }

    let entry = store.fetch_entry(uid)?;
    // Stale or duplicate replay: leave everything untouched
    if entry.version >= version {
        return Err(MetaError::InvalidRequest(format!(
            "stale version:{}, stored:{}",
            version, entry.version
        )));
    }

    let schema_row = match &entry.payload {
        EntryPayload::Normal { schema_row, .. } => schema_row,
        _ => {
            return Err(MetaError::Internal(format!(
                "uid index marks uid:{} normal but entry is not",
                uid
            )))
        }
    };
    if schema_row.find_column(&req.col_name).is_some() {
        return Err(MetaError::AlreadyExists {
            name: req.col_name.clone(),
            uid,
        });
    }
    if schema_row.row_size() + req.bytes > MAX_BYTES_PER_ROW {
        return Err(MetaError::ResourceExhausted(format!(
            "row width {} + {} exceeds limit {}",
            schema_row.row_size(),
            req.bytes,
            MAX_BYTES_PER_ROW
        )));
    }

    Ok(entry)
}

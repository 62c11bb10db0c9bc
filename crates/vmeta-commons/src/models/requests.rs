//! Request and response types for the metadata write path.
//!
//! Requests arrive pre-assigned: the caller (the write-ahead-log replay
//! path) has already allocated uids and carries the log version
//! separately, so replaying the same request twice must converge on the
//! same state.

use crate::models::ids::{SchemaVersion, TableKind, Uid};
use crate::models::schema::{ColCmprWrapper, ColumnDataType, RollupParam, SchemaWrapper};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSuperTableReq {
    pub name: String,
    /// Caller-assigned uid; doubles as the suid for future children
    pub suid: Uid,
    pub schema_row: SchemaWrapper,
    pub schema_tag: SchemaWrapper,
    pub rollup: Option<RollupParam>,
    pub col_cmpr: Option<ColCmprWrapper>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateChildTableReq {
    pub name: String,
    pub uid: Uid,
    /// Name of the parent super table; must resolve to `suid`
    pub parent_name: String,
    /// Uid of the parent super table, resolved by the caller
    pub suid: Uid,
    /// Serialized tag values, opaque to this layer
    pub tags: Vec<u8>,
    pub btime_ms: i64,
    pub ttl_days: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateNormalTableReq {
    pub name: String,
    pub uid: Uid,
    pub schema_row: SchemaWrapper,
    pub btime_ms: i64,
    pub ttl_days: i32,
    pub comment: Option<String>,
    pub col_cmpr: Option<ColCmprWrapper>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropTableReq {
    pub name: String,
    /// Treat a missing table as success (idempotent replay)
    pub ignore_not_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropSuperTableReq {
    pub name: String,
    /// Expected uid of the super table; a mismatch rejects the drop
    pub suid: Uid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddColumnReq {
    pub table_name: String,
    pub col_name: String,
    pub data_type: ColumnDataType,
    pub bytes: i32,
    pub flags: u8,
}

/// Metadata echoed to the caller after a successful create or alter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetaRsp {
    pub name: String,
    pub uid: Uid,
    pub suid: Uid,
    pub kind: TableKind,
    pub schema_version: SchemaVersion,
    /// Resolved row schema: the table's own for super/normal tables,
    /// the parent's for child tables
    pub schema_row: Option<SchemaWrapper>,
}

/// Distinguishes a fresh create from the idempotent replay of one that
/// already applied. Both are success.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created(TableMetaRsp),
    Existed(TableMetaRsp),
}

impl CreateOutcome {
    pub fn rsp(&self) -> &TableMetaRsp {
        match self {
            CreateOutcome::Created(rsp) => rsp,
            CreateOutcome::Existed(rsp) => rsp,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, CreateOutcome::Created(_))
    }
}

//! Table entry records and derived index values.
//!
//! A `TableEntry` is the authoritative record of one table at one log
//! version. The entry table keeps every version ever written, including
//! tombstones, so it doubles as a history of the vnode's metadata.

use crate::models::ids::{SchemaVersion, TableKind, Uid, Version};
use crate::models::schema::{ColCmprWrapper, RollupParam, SchemaWrapper};
use serde::{Deserialize, Serialize};

/// Kind-specific part of a table entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntryPayload {
    Super {
        schema_row: SchemaWrapper,
        schema_tag: SchemaWrapper,
        rollup: Option<RollupParam>,
    },
    Child {
        /// Uid of the parent super table
        suid: Uid,
        /// Serialized tag values, opaque to this layer
        tags: Vec<u8>,
        btime_ms: i64,
        ttl_days: i32,
        comment: Option<String>,
    },
    Normal {
        schema_row: SchemaWrapper,
        /// Next column id to assign on AddColumn
        ncid: i16,
        btime_ms: i64,
        ttl_days: i32,
        comment: Option<String>,
    },
    /// Tombstone: the table of this kind was dropped at this entry's
    /// version
    Dropped(TableKind),
}

/// Authoritative record of one table at one log version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    /// Log sequence number under which this record was written
    pub version: Version,
    pub uid: Uid,
    pub name: String,
    pub flags: u8,
    pub payload: EntryPayload,
    pub col_cmpr: Option<ColCmprWrapper>,
}

impl TableEntry {
    pub fn kind(&self) -> TableKind {
        match &self.payload {
            EntryPayload::Super { .. } => TableKind::Super,
            EntryPayload::Child { .. } => TableKind::Child,
            EntryPayload::Normal { .. } => TableKind::Normal,
            EntryPayload::Dropped(kind) => *kind,
        }
    }

    pub fn is_dropped(&self) -> bool {
        matches!(self.payload, EntryPayload::Dropped(_))
    }

    /// The suid convention: 0 for normal tables, the table's own uid for
    /// super tables, the parent's uid for child tables.
    pub fn suid(&self) -> Uid {
        match &self.payload {
            EntryPayload::Super { .. } => self.uid,
            EntryPayload::Child { suid, .. } => *suid,
            EntryPayload::Normal { .. } => 0,
            EntryPayload::Dropped(kind) => match kind {
                TableKind::Super => self.uid,
                _ => 0,
            },
        }
    }

    /// Row-schema version for tables that own a schema; child tables
    /// report 0 (their schema lives on the parent).
    pub fn schema_version(&self) -> SchemaVersion {
        match &self.payload {
            EntryPayload::Super { schema_row, .. } => schema_row.version,
            EntryPayload::Normal { schema_row, .. } => schema_row.version,
            _ => 0,
        }
    }

    pub fn btime_ms(&self) -> Option<i64> {
        match &self.payload {
            EntryPayload::Child { btime_ms, .. } => Some(*btime_ms),
            EntryPayload::Normal { btime_ms, .. } => Some(*btime_ms),
            _ => None,
        }
    }

    pub fn ttl_days(&self) -> Option<i32> {
        match &self.payload {
            EntryPayload::Child { ttl_days, .. } => Some(*ttl_days),
            EntryPayload::Normal { ttl_days, .. } => Some(*ttl_days),
            _ => None,
        }
    }
}

/// Compact lookup record served from the uid index and its in-memory
/// mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaInfo {
    pub uid: Uid,
    /// Version of the latest entry for this uid
    pub version: Version,
    /// 0 = normal table, own uid = super table, parent uid = child table
    pub suid: Uid,
    pub skm_ver: SchemaVersion,
}

impl MetaInfo {
    pub fn kind(&self) -> TableKind {
        TableKind::from_uid_suid(self.uid, self.suid)
    }
}

/// Value stored in the uid index partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UidIdxVal {
    pub suid: Uid,
    pub skm_ver: SchemaVersion,
    pub version: Version,
}

impl UidIdxVal {
    pub fn to_info(self, uid: Uid) -> MetaInfo {
        MetaInfo {
            uid,
            version: self.version,
            suid: self.suid,
            skm_ver: self.skm_ver,
        }
    }
}

/// Record fed to the TTL manager for tables with a retention period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlInfo {
    pub uid: Uid,
    pub ttl_days: i32,
    /// Wall-clock time of the last TTL-relevant change
    pub change_time_ms: i64,
}

//! Typed identifiers and the table-kind taxonomy.

use serde::{Deserialize, Serialize};

/// Globally unique table identifier within a vnode. Always > 0 for live
/// tables.
pub type Uid = i64;

/// Monotonic log sequence number; every applied metadata operation
/// carries the version under which it was logged.
pub type Version = i64;

/// Version of a table's row (or tag) schema.
pub type SchemaVersion = i32;

/// Identifier of the owning vnode, carried in log messages.
pub type VgId = i32;

/// The three kinds of tables a vnode's metadata store manages.
///
/// The kind is recoverable from the (uid, suid) pair alone:
/// - super table: `suid == uid`
/// - child table: `suid != 0 && suid != uid`
/// - normal table: `suid == 0`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableKind {
    /// Template table: defines row and tag schemas, holds no rows itself
    Super,
    /// Instance of a super table; carries tag values, no own schema
    Child,
    /// Standalone table with its own row schema
    Normal,
}

impl TableKind {
    /// Classifies a table from its (uid, suid) pair.
    pub fn from_uid_suid(uid: Uid, suid: Uid) -> TableKind {
        if suid == 0 {
            TableKind::Normal
        } else if suid == uid {
            TableKind::Super
        } else {
            TableKind::Child
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Super => "super",
            TableKind::Child => "child",
            TableKind::Normal => "normal",
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

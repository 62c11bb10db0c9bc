//! The (index × operation) routing matrix and the per-kind ordered
//! operation lists.
//!
//! Each logical transition (create super table, drop child table, ...)
//! is a fixed ordered list of (table, operation) pairs applied
//! start-to-finish; order matters because later writes assume earlier
//! ones succeeded (the name index is only written after the uid index
//! confirmed no conflict). The lists are first-class consts so ordering
//! is testable without a store or a lock.
//!
//! Absent matrix cells are intentional: the super-uid index has no
//! update because membership never changes, the schema table has no
//! delete because schema history is append-only.

use crate::error::{MetaError, Result};
use crate::index_set::MetaTable;
use crate::store::MetaStore;
use crate::writers::{self, WriterFn};
use log::error;
use vmeta_commons::TableEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOp {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaTableOp {
    pub table: MetaTable,
    pub op: TableOp,
}

const fn op(table: MetaTable, op: TableOp) -> MetaTableOp {
    MetaTableOp { table, op }
}

/// Returns the writer for one matrix cell, or `None` for cells that
/// have no meaning.
pub(crate) fn writer_for(table: MetaTable, table_op: TableOp) -> Option<WriterFn> {
    use MetaTable::*;
    use TableOp::*;
    match (table, table_op) {
        (Entry, Insert) => Some(writers::entry_insert),
        (Entry, Delete) => Some(writers::entry_delete),
        (Schema, Update) => Some(writers::schema_upsert),
        (UidIdx, Insert) => Some(writers::uid_idx_insert),
        (UidIdx, Update) => Some(writers::uid_idx_update),
        (UidIdx, Delete) => Some(writers::uid_idx_delete),
        (NameIdx, Insert) => Some(writers::name_idx_insert),
        (NameIdx, Delete) => Some(writers::name_idx_delete),
        (SuidIdx, Insert) => Some(writers::suid_idx_insert),
        (SuidIdx, Delete) => Some(writers::suid_idx_delete),
        (ChildIdx, Insert) => Some(writers::child_idx_insert),
        (ChildIdx, Delete) => Some(writers::child_idx_delete),
        (TagIdx, Insert) => Some(writers::tag_idx_insert),
        (TagIdx, Delete) => Some(writers::tag_idx_delete),
        (BtimeIdx, Insert) => Some(writers::btime_idx_insert),
        (BtimeIdx, Delete) => Some(writers::btime_idx_delete),
        (TtlIdx, Insert) | (TtlIdx, Update) => Some(writers::ttl_idx_upsert),
        (TtlIdx, Delete) => Some(writers::ttl_idx_remove),
        _ => None,
    }
}

pub const SUPER_TABLE_CREATE_OPS: &[MetaTableOp] = &[
    op(MetaTable::Entry, TableOp::Insert),
    op(MetaTable::Schema, TableOp::Update),
    op(MetaTable::UidIdx, TableOp::Insert),
    op(MetaTable::NameIdx, TableOp::Insert),
    op(MetaTable::SuidIdx, TableOp::Insert),
];

/// Applied when a replayed super-table create carries a newer schema.
pub const SUPER_TABLE_UPDATE_OPS: &[MetaTableOp] = &[
    op(MetaTable::Entry, TableOp::Insert),
    op(MetaTable::Schema, TableOp::Update),
    op(MetaTable::UidIdx, TableOp::Update),
];

pub const NORMAL_TABLE_CREATE_OPS: &[MetaTableOp] = &[
    op(MetaTable::Entry, TableOp::Insert),
    op(MetaTable::Schema, TableOp::Update),
    op(MetaTable::UidIdx, TableOp::Insert),
    op(MetaTable::NameIdx, TableOp::Insert),
    op(MetaTable::BtimeIdx, TableOp::Insert),
    op(MetaTable::TtlIdx, TableOp::Insert),
];

/// Applied by AddColumn: refreshes entry, schema history and uid index.
pub const NORMAL_TABLE_UPDATE_OPS: &[MetaTableOp] = &[
    op(MetaTable::Entry, TableOp::Insert),
    op(MetaTable::Schema, TableOp::Update),
    op(MetaTable::UidIdx, TableOp::Update),
];

pub const CHILD_TABLE_CREATE_OPS: &[MetaTableOp] = &[
    op(MetaTable::Entry, TableOp::Insert),
    op(MetaTable::UidIdx, TableOp::Insert),
    op(MetaTable::NameIdx, TableOp::Insert),
    op(MetaTable::ChildIdx, TableOp::Insert),
    op(MetaTable::TagIdx, TableOp::Insert),
    op(MetaTable::BtimeIdx, TableOp::Insert),
    op(MetaTable::TtlIdx, TableOp::Insert),
];

pub const NORMAL_TABLE_DROP_OPS: &[MetaTableOp] = &[
    op(MetaTable::Entry, TableOp::Delete),
    op(MetaTable::UidIdx, TableOp::Delete),
    op(MetaTable::NameIdx, TableOp::Delete),
    op(MetaTable::BtimeIdx, TableOp::Delete),
    op(MetaTable::TtlIdx, TableOp::Delete),
];

pub const CHILD_TABLE_DROP_OPS: &[MetaTableOp] = &[
    op(MetaTable::Entry, TableOp::Delete),
    op(MetaTable::UidIdx, TableOp::Delete),
    op(MetaTable::NameIdx, TableOp::Delete),
    op(MetaTable::ChildIdx, TableOp::Delete),
    op(MetaTable::TagIdx, TableOp::Delete),
    op(MetaTable::BtimeIdx, TableOp::Delete),
    op(MetaTable::TtlIdx, TableOp::Delete),
];

pub const SUPER_TABLE_DROP_OPS: &[MetaTableOp] = &[
    op(MetaTable::Entry, TableOp::Delete),
    op(MetaTable::UidIdx, TableOp::Delete),
    op(MetaTable::NameIdx, TableOp::Delete),
    op(MetaTable::SuidIdx, TableOp::Delete),
];

/// Applies an ordered operation list for one entry, stopping at the
/// first failing step. Already-applied writes are not undone.
pub(crate) fn apply_ops(
    store: &MetaStore,
    entry: &TableEntry,
    ops: &[MetaTableOp],
) -> Result<()> {
    for step in ops {
        let writer = writer_for(step.table, step.op).ok_or_else(|| {
            MetaError::Internal(format!("no writer for {} {:?}", step.table, step.op))
        })?;
        if let Err(e) = writer(store, entry) {
            error!(
                "vgId:{} {} {:?} failed, uid:{} name:{} version:{} since {}",
                store.vgid, step.table, step.op, entry.uid, entry.name, entry.version, e
            );
            return Err(e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_listed_op_has_a_writer() {
        let lists = [
            SUPER_TABLE_CREATE_OPS,
            SUPER_TABLE_UPDATE_OPS,
            NORMAL_TABLE_CREATE_OPS,
            NORMAL_TABLE_UPDATE_OPS,
            CHILD_TABLE_CREATE_OPS,
            NORMAL_TABLE_DROP_OPS,
            CHILD_TABLE_DROP_OPS,
            SUPER_TABLE_DROP_OPS,
        ];
        for list in lists {
            for step in list {
                assert!(
                    writer_for(step.table, step.op).is_some(),
                    "missing writer for {} {:?}",
                    step.table,
                    step.op
                );
            }
        }
    }

    #[test]
    fn test_intentionally_absent_cells() {
        assert!(writer_for(MetaTable::SuidIdx, TableOp::Update).is_none());
        assert!(writer_for(MetaTable::Schema, TableOp::Delete).is_none());
        assert!(writer_for(MetaTable::Entry, TableOp::Update).is_none());
    }

    #[test]
    fn test_name_index_written_after_uid_index() {
        for list in [
            SUPER_TABLE_CREATE_OPS,
            NORMAL_TABLE_CREATE_OPS,
            CHILD_TABLE_CREATE_OPS,
        ] {
            let uid_pos = list
                .iter()
                .position(|s| s.table == MetaTable::UidIdx)
                .unwrap();
            let name_pos = list
                .iter()
                .position(|s| s.table == MetaTable::NameIdx)
                .unwrap();
            assert!(uid_pos < name_pos);
        }
    }

    #[test]
    fn test_entry_written_first_in_every_list() {
        for list in [
            SUPER_TABLE_CREATE_OPS,
            SUPER_TABLE_UPDATE_OPS,
            NORMAL_TABLE_CREATE_OPS,
            NORMAL_TABLE_UPDATE_OPS,
            CHILD_TABLE_CREATE_OPS,
            NORMAL_TABLE_DROP_OPS,
            CHILD_TABLE_DROP_OPS,
            SUPER_TABLE_DROP_OPS,
        ] {
            assert_eq!(list[0].table, MetaTable::Entry);
        }
    }
}

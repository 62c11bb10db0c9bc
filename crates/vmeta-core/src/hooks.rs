//! Data-cache priming hook.
//!
//! Lets the time-series data cache warm itself when tables appear or
//! disappear. Strictly best-effort: the store logs hook failures and
//! never fails the triggering operation on them.

use vmeta_commons::{SchemaWrapper, Uid};

pub trait DataCacheHook: Send + Sync {
    /// A table became visible. `suid` is 0 for normal tables, the
    /// parent uid for child tables, the table's own uid for super
    /// tables.
    fn table_created(&self, uid: Uid, suid: Uid, schema: Option<&SchemaWrapper>);

    fn table_dropped(&self, uid: Uid, suid: Uid);
}

/// Default hook: does nothing.
pub struct NoopHook;

impl DataCacheHook for NoopHook {
    fn table_created(&self, _uid: Uid, _suid: Uid, _schema: Option<&SchemaWrapper>) {}

    fn table_dropped(&self, _uid: Uid, _suid: Uid) {}
}

//! Per-partition metadata counters.
//!
//! An explicit collaborator passed into the store, not a hidden global,
//! so tests can assert on it directly. Mutated only after a write
//! sequence fully succeeds.

use std::sync::atomic::{AtomicI64, Ordering};

#[derive(Default)]
pub struct MetaStats {
    super_tables: AtomicI64,
    child_tables: AtomicI64,
    normal_tables: AtomicI64,
    /// Total time-series columns across child and normal tables
    time_series: AtomicI64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub super_tables: i64,
    pub child_tables: i64,
    pub normal_tables: i64,
    pub time_series: i64,
}

impl MetaStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_super_tables(&self, delta: i64) {
        self.super_tables.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn add_child_tables(&self, delta: i64) {
        self.child_tables.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn add_normal_tables(&self, delta: i64) {
        self.normal_tables.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn add_time_series(&self, delta: i64) {
        self.time_series.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            super_tables: self.super_tables.load(Ordering::Relaxed),
            child_tables: self.child_tables.load(Ordering::Relaxed),
            normal_tables: self.normal_tables.load(Ordering::Relaxed),
            time_series: self.time_series.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = MetaStats::new();
        stats.add_super_tables(1);
        stats.add_child_tables(2);
        stats.add_time_series(5);
        stats.add_child_tables(-1);

        let snap = stats.snapshot();
        assert_eq!(snap.super_tables, 1);
        assert_eq!(snap.child_tables, 1);
        assert_eq!(snap.normal_tables, 0);
        assert_eq!(snap.time_series, 5);
    }
}

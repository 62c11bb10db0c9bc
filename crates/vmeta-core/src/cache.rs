//! In-memory existence cache.
//!
//! A read-through mirror of the uid index. Mutated only by the uid-index
//! writers, never independently, so it cannot diverge from the index it
//! shadows. Never a source of truth: a miss falls back to the index.

use std::collections::HashMap;
use std::sync::RwLock;
use vmeta_commons::{MetaInfo, Uid};

#[derive(Default)]
pub struct MetaCache {
    entries: RwLock<HashMap<Uid, MetaInfo>>,
}

impl MetaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, uid: Uid) -> Option<MetaInfo> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(&uid).copied()
    }

    pub fn upsert(&self, info: MetaInfo) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(info.uid, info);
    }

    pub fn evict(&self, uid: Uid) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(&uid);
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

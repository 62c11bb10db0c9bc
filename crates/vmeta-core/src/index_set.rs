//! The physical metadata tables and their key layouts.
//!
//! Eight partitions plus the TTL index, each with a fixed key/value
//! shape. Composite keys are big-endian concatenations so lexicographic
//! byte order matches numeric order; uids, versions and creation times
//! are non-negative, which keeps the ordering sound for i64 fields.

use vmeta_commons::{SchemaVersion, Uid, Version};
use vmeta_store::{Partition, StorageBackend};

/// The physical metadata tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaTable {
    /// (version, uid) → encoded entry; authoritative history
    Entry,
    /// (uid, schema version) → encoded schema; append-only history
    Schema,
    /// uid → (suid, skmVer, version); existence + type + cache mirror
    UidIdx,
    /// name → uid; uniqueness enforcement
    NameIdx,
    /// uid → (); super-table set membership
    SuidIdx,
    /// (suid, uid) → tag blob; children of a super table
    ChildIdx,
    /// (suid, tag blob length, tag blob, uid) → (); tag-value lookup
    TagIdx,
    /// (uid, btime) → (); creation-time ordering
    BtimeIdx,
    /// uid → TtlInfo; owned by the TTL manager
    TtlIdx,
}

impl MetaTable {
    pub const ALL: [MetaTable; 9] = [
        MetaTable::Entry,
        MetaTable::Schema,
        MetaTable::UidIdx,
        MetaTable::NameIdx,
        MetaTable::SuidIdx,
        MetaTable::ChildIdx,
        MetaTable::TagIdx,
        MetaTable::BtimeIdx,
        MetaTable::TtlIdx,
    ];

    pub fn partition_name(&self) -> &'static str {
        match self {
            MetaTable::Entry => "meta_entry",
            MetaTable::Schema => "meta_schema",
            MetaTable::UidIdx => "meta_uid_idx",
            MetaTable::NameIdx => "meta_name_idx",
            MetaTable::SuidIdx => "meta_suid_idx",
            MetaTable::ChildIdx => "meta_child_idx",
            MetaTable::TagIdx => "meta_tag_idx",
            MetaTable::BtimeIdx => "meta_btime_idx",
            MetaTable::TtlIdx => "meta_ttl_idx",
        }
    }

    pub fn partition(&self) -> Partition {
        Partition::new(self.partition_name())
    }
}

impl std::fmt::Display for MetaTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.partition_name())
    }
}

/// Creates every metadata partition. Idempotent; called once at store
/// open.
pub fn create_partitions(backend: &dyn StorageBackend) -> vmeta_store::storage_trait::Result<()> {
    for table in MetaTable::ALL {
        backend.create_partition(&table.partition())?;
    }
    Ok(())
}

/// Key builders. All multi-field keys concatenate big-endian encodings.
pub mod keys {
    use super::*;

    pub fn entry(version: Version, uid: Uid) -> Vec<u8> {
        let mut key = Vec::with_capacity(16);
        key.extend_from_slice(&version.to_be_bytes());
        key.extend_from_slice(&uid.to_be_bytes());
        key
    }

    pub fn schema(uid: Uid, sver: SchemaVersion) -> Vec<u8> {
        let mut key = Vec::with_capacity(12);
        key.extend_from_slice(&uid.to_be_bytes());
        key.extend_from_slice(&sver.to_be_bytes());
        key
    }

    pub fn uid(uid: Uid) -> Vec<u8> {
        uid.to_be_bytes().to_vec()
    }

    pub fn name(name: &str) -> Vec<u8> {
        name.as_bytes().to_vec()
    }

    pub fn child(suid: Uid, uid: Uid) -> Vec<u8> {
        let mut key = Vec::with_capacity(16);
        key.extend_from_slice(&suid.to_be_bytes());
        key.extend_from_slice(&uid.to_be_bytes());
        key
    }

    /// Prefix matching every child of one super table.
    pub fn child_prefix(suid: Uid) -> Vec<u8> {
        suid.to_be_bytes().to_vec()
    }

    /// The tag blob is length-prefixed so a prefix scan over
    /// `tag_prefix` cannot match a longer blob that merely starts with
    /// the queried bytes.
    pub fn tag(suid: Uid, tags: &[u8], uid: Uid) -> Vec<u8> {
        let mut key = Vec::with_capacity(20 + tags.len());
        key.extend_from_slice(&suid.to_be_bytes());
        key.extend_from_slice(&(tags.len() as u32).to_be_bytes());
        key.extend_from_slice(tags);
        key.extend_from_slice(&uid.to_be_bytes());
        key
    }

    /// Prefix matching every child of one super table carrying exactly
    /// this tag blob.
    pub fn tag_prefix(suid: Uid, tags: &[u8]) -> Vec<u8> {
        let mut key = Vec::with_capacity(12 + tags.len());
        key.extend_from_slice(&suid.to_be_bytes());
        key.extend_from_slice(&(tags.len() as u32).to_be_bytes());
        key.extend_from_slice(tags);
        key
    }

    pub fn btime(uid: Uid, btime_ms: i64) -> Vec<u8> {
        let mut key = Vec::with_capacity(16);
        key.extend_from_slice(&uid.to_be_bytes());
        key.extend_from_slice(&btime_ms.to_be_bytes());
        key
    }

    /// Decodes the trailing uid of a child-index or tag-index key.
    pub fn trailing_uid(key: &[u8]) -> Option<Uid> {
        if key.len() < 8 {
            return None;
        }
        let tail: [u8; 8] = key[key.len() - 8..].try_into().ok()?;
        Some(Uid::from_be_bytes(tail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_names_are_distinct() {
        let names: std::collections::HashSet<_> =
            MetaTable::ALL.iter().map(|t| t.partition_name()).collect();
        assert_eq!(names.len(), MetaTable::ALL.len());
    }

    #[test]
    fn test_entry_keys_sort_by_version_then_uid() {
        let a = keys::entry(1, 500);
        let b = keys::entry(2, 100);
        let c = keys::entry(2, 200);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_child_keys_group_under_suid_prefix() {
        let prefix = keys::child_prefix(100);
        let k1 = keys::child(100, 201);
        let k2 = keys::child(100, 202);
        let other = keys::child(101, 201);
        assert!(k1.starts_with(&prefix));
        assert!(k2.starts_with(&prefix));
        assert!(!other.starts_with(&prefix));
        assert_eq!(keys::trailing_uid(&k1), Some(201));
    }

    #[test]
    fn test_tag_prefix_rejects_extended_blobs() {
        let k_exact = keys::tag(100, b"bj", 201);
        let k_longer = keys::tag(100, b"bjx", 202);
        let prefix = keys::tag_prefix(100, b"bj");
        assert!(k_exact.starts_with(&prefix));
        assert!(!k_longer.starts_with(&prefix));
        assert_eq!(keys::trailing_uid(&k_exact), Some(201));
    }

    #[test]
    fn test_schema_keys_sort_by_version_per_uid() {
        let v1 = keys::schema(42, 1);
        let v2 = keys::schema(42, 2);
        assert!(v1 < v2);
    }

    #[test]
    fn test_create_partitions_idempotent() {
        let backend = vmeta_store::test_utils::InMemoryBackend::new();
        create_partitions(&backend).unwrap();
        create_partitions(&backend).unwrap();
        for table in MetaTable::ALL {
            assert!(backend.partition_exists(&table.partition()));
        }
    }
}

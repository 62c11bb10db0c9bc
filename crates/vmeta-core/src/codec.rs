//! Entry and schema serialization.
//!
//! Payloads are stored as self-describing JSON so historical schema
//! snapshots written under earlier schema versions stay decodable after
//! the table's schema moves on. Round-trips are field-exact.

use crate::error::{MetaError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use vmeta_commons::{SchemaWrapper, TableEntry};

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| MetaError::Serialization(e.to_string()))
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| MetaError::Serialization(e.to_string()))
}

pub fn encode_entry(entry: &TableEntry) -> Result<Vec<u8>> {
    encode(entry)
}

pub fn decode_entry(bytes: &[u8]) -> Result<TableEntry> {
    decode(bytes)
}

pub fn encode_schema(schema: &SchemaWrapper) -> Result<Vec<u8>> {
    encode(schema)
}

pub fn decode_schema(bytes: &[u8]) -> Result<SchemaWrapper> {
    decode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmeta_commons::{
        ColumnDataType, ColumnSchema, EntryPayload, RollupParam, SchemaWrapper, TableEntry,
    };

    fn row_schema() -> SchemaWrapper {
        SchemaWrapper::new(
            1,
            vec![
                ColumnSchema::new(1, "ts", ColumnDataType::Timestamp, 8),
                ColumnSchema::new(2, "voltage", ColumnDataType::Int, 4),
            ],
        )
    }

    #[test]
    fn test_super_entry_round_trip_with_rollup() {
        let entry = TableEntry {
            version: 1,
            uid: 100,
            name: "meters".to_string(),
            flags: 0,
            payload: EntryPayload::Super {
                schema_row: row_schema(),
                schema_tag: SchemaWrapper::new(
                    1,
                    vec![ColumnSchema::new(1, "loc", ColumnDataType::VarChar, 16)],
                ),
                rollup: Some(RollupParam {
                    funcs: vec!["avg".to_string()],
                    max_delay_ms: vec![5000],
                    watermark_ms: vec![1000],
                }),
            },
            col_cmpr: None,
        };
        let back = decode_entry(&encode_entry(&entry).unwrap()).unwrap();
        assert_eq!(entry, back);
    }

    #[test]
    fn test_child_entry_round_trip() {
        let entry = TableEntry {
            version: 2,
            uid: 201,
            name: "d1".to_string(),
            flags: 0,
            payload: EntryPayload::Child {
                suid: 100,
                tags: b"loc=bj".to_vec(),
                btime_ms: 1_700_000_000_000,
                ttl_days: 30,
                comment: Some("device 1".to_string()),
            },
            col_cmpr: None,
        };
        let back = decode_entry(&encode_entry(&entry).unwrap()).unwrap();
        assert_eq!(entry, back);
    }

    #[test]
    fn test_truncated_input_fails_cleanly() {
        let entry = TableEntry {
            version: 1,
            uid: 1,
            name: "t".to_string(),
            flags: 0,
            payload: EntryPayload::Normal {
                schema_row: row_schema(),
                ncid: 3,
                btime_ms: 0,
                ttl_days: 0,
                comment: None,
            },
            col_cmpr: None,
        };
        let mut bytes = encode_entry(&entry).unwrap();
        bytes.truncate(bytes.len() / 2);
        assert!(matches!(
            decode_entry(&bytes),
            Err(MetaError::Serialization(_))
        ));
    }

    #[test]
    fn test_schema_round_trip() {
        let schema = row_schema();
        let back = decode_schema(&encode_schema(&schema).unwrap()).unwrap();
        assert_eq!(schema, back);
    }
}

//! Column and schema definitions.
//!
//! A table's row schema is a versioned, ordered list of columns. Schema
//! versions only ever grow; historical versions stay decodable so old
//! data files can still be interpreted.

use crate::models::ids::SchemaVersion;
use serde::{Deserialize, Serialize};

/// Widest row a table may declare, in bytes, summed over column widths.
pub const MAX_BYTES_PER_ROW: i32 = 49_151;

/// Column data types supported by the storage format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnDataType {
    Bool,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    UTinyInt,
    USmallInt,
    UInt,
    UBigInt,
    Float,
    Double,
    Timestamp,
    VarChar,
    NChar,
    VarBinary,
    Json,
    Geometry,
}

impl ColumnDataType {
    /// True for types whose on-disk width comes from the column's
    /// declared `bytes`, not from the type itself.
    pub fn is_var_len(&self) -> bool {
        matches!(
            self,
            ColumnDataType::VarChar
                | ColumnDataType::NChar
                | ColumnDataType::VarBinary
                | ColumnDataType::Json
                | ColumnDataType::Geometry
        )
    }
}

/// Per-column flag bits.
pub mod col_flags {
    /// Column participates in pre-computed small materialized aggregates.
    pub const SMA_ON: u8 = 0x01;
    /// Column is the primary (timestamp) key.
    pub const PRIMARY_KEY: u8 = 0x02;
}

/// A single column of a row or tag schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column id, unique within the table for its whole lifetime.
    /// Never reused, even after the column is dropped.
    pub col_id: i16,
    pub name: String,
    pub data_type: ColumnDataType,
    /// Declared width in bytes (payload width for fixed types, max
    /// width for variable-length types).
    pub bytes: i32,
    pub flags: u8,
}

impl ColumnSchema {
    pub fn new(
        col_id: i16,
        name: impl Into<String>,
        data_type: ColumnDataType,
        bytes: i32,
    ) -> Self {
        Self {
            col_id,
            name: name.into(),
            data_type,
            bytes,
            flags: 0,
        }
    }
}

/// A versioned, ordered column list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaWrapper {
    pub version: SchemaVersion,
    pub columns: Vec<ColumnSchema>,
}

impl SchemaWrapper {
    pub fn new(version: SchemaVersion, columns: Vec<ColumnSchema>) -> Self {
        Self { version, columns }
    }

    /// Total declared row width in bytes.
    pub fn row_size(&self) -> i32 {
        self.columns.iter().map(|c| c.bytes).sum()
    }

    pub fn find_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Highest column id in use, or 0 for an empty schema.
    pub fn max_col_id(&self) -> i16 {
        self.columns.iter().map(|c| c.col_id).max().unwrap_or(0)
    }
}

/// Compression algorithm choice for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnCompression {
    pub col_id: i16,
    /// Packed encode/compress/level selector, engine-defined.
    pub alg: u32,
}

/// Per-table column compression settings, versioned alongside the row
/// schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColCmprWrapper {
    pub version: SchemaVersion,
    pub columns: Vec<ColumnCompression>,
}

/// Rollup configuration a super table may carry for downsampled
/// materialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupParam {
    pub funcs: Vec<String>,
    pub max_delay_ms: Vec<i64>,
    pub watermark_ms: Vec<i64>,
}

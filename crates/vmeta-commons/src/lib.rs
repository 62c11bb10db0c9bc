//! # vmeta-commons
//!
//! Shared data models for the per-vnode table metadata layer: typed
//! identifiers, column and schema definitions, table entry records, and
//! the request/response types exchanged with the write path.
//!
//! This crate is dependency-light on purpose: models only, no storage or
//! engine code.

pub mod models;

pub use models::entry::{EntryPayload, MetaInfo, TableEntry, TtlInfo, UidIdxVal};
pub use models::ids::{SchemaVersion, TableKind, Uid, Version, VgId};
pub use models::requests::{
    AddColumnReq, CreateChildTableReq, CreateNormalTableReq, CreateOutcome, CreateSuperTableReq,
    DropSuperTableReq, DropTableReq, TableMetaRsp,
};
pub use models::schema::{
    ColCmprWrapper, ColumnCompression, ColumnDataType, ColumnSchema, RollupParam, SchemaWrapper,
    col_flags,
};

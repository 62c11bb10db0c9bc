//! Data models shared across the metadata crates.

pub mod entry;
pub mod ids;
pub mod requests;
pub mod schema;

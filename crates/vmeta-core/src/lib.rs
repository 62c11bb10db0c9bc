//! # vmeta-core
//!
//! The transactional entry-application subsystem of a vnode's table
//! metadata store: given a logical operation (create/alter/drop a
//! table) at a log version, it applies consistent writes across the
//! authoritative entry record, the schema history, and six secondary
//! indexes.
//!
//! ## Architecture
//!
//! ```text
//! MetaStore façade (lock, logging)
//!     ↓
//! validators (read-only pre-commit checks)
//!     ↓
//! handler (per-kind ordered write sequences)
//!     ↓
//! dispatch matrix → writers → StorageBackend partitions
//! ```
//!
//! There is no multi-key atomic commit underneath: consistency comes
//! from the exclusive per-partition lock, fixed write ordering, and
//! idempotent replay of whole logical operations.

pub mod cache;
pub mod codec;
pub mod dispatch;
pub mod error;
pub mod grant;
mod handler;
pub mod hooks;
pub mod index_set;
pub mod stats;
pub mod store;
pub mod ttl;
mod validators;
mod writers;

pub use cache::MetaCache;
pub use error::{MetaError, Result};
pub use grant::{AllowAll, DenyAll, Grant, GrantPolicy};
pub use hooks::{DataCacheHook, NoopHook};
pub use index_set::MetaTable;
pub use stats::{MetaStats, StatsSnapshot};
pub use store::MetaStore;
pub use ttl::{TtlIndex, TtlManager};

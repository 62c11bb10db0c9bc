//! Error taxonomy for metadata operations.

use thiserror::Error;
use vmeta_commons::Uid;
use vmeta_store::StorageError;

pub type Result<T> = std::result::Result<T, MetaError>;

/// Errors surfaced by the metadata write and read paths.
///
/// Validators fail fast before any write; once a write sequence starts,
/// the first failing step aborts the rest with no compensation, so a
/// storage error mid-sequence can leave indexes ahead of the entry
/// record until the operation is replayed.
#[derive(Debug, Error)]
pub enum MetaError {
    /// Malformed input: empty name, self-referential suid, stale
    /// version, oversized row
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Name or uid collision with a conflicting identity or type. The
    /// idempotent same-identity replay is not an error; see
    /// `CreateOutcome::Existed`.
    #[error("already exists: {name} (uid:{uid})")]
    AlreadyExists { name: String, uid: Uid },

    /// Referenced table or parent absent
    #[error("not found: {0}")]
    NotFound(String),

    /// Quota exceeded or row-width budget exhausted
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Invariant violation detected mid-operation; indicates prior
    /// corruption, surfaced distinctly from ordinary not-found
    #[error("internal error: {0}")]
    Internal(String),

    /// Grant check failure
    #[error("denied: {0}")]
    Denied(String),

    /// Entry or schema payload failed to encode or decode
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Underlying key-value engine failure, propagated verbatim
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

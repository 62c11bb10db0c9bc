//! Grant checks: capacity gates consulted before time-series-producing
//! creates.

use crate::error::{MetaError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    /// Permission to add time-series columns (child and normal table
    /// creates)
    TimeSeries,
}

pub trait GrantPolicy: Send + Sync {
    /// Returns `Err(MetaError::Denied)` when the capability is
    /// exhausted. Rejection guarantees the operation performed no
    /// writes.
    fn check(&self, grant: Grant) -> Result<()>;
}

/// Default policy: everything is granted.
pub struct AllowAll;

impl GrantPolicy for AllowAll {
    fn check(&self, _grant: Grant) -> Result<()> {
        Ok(())
    }
}

/// Policy that denies everything. Test helper for quota-rejection paths.
pub struct DenyAll;

impl GrantPolicy for DenyAll {
    fn check(&self, grant: Grant) -> Result<()> {
        Err(MetaError::Denied(format!("grant check failed: {:?}", grant)))
    }
}

//! Soft-delete lifecycle shared by items and containers.

use serde::{Deserialize, Serialize};

/// Visibility state of a positioned row.
///
/// `Deleted` rows are tombstones: they keep their last position for history
/// but are never part of an ordering scan again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Lifecycle {
    /// Row participates in ordering.
    Active,
    /// Row was soft-deleted at the given epoch ms timestamp.
    Deleted { at: i64 },
}

impl Lifecycle {
    /// Returns whether the row is visible to ordering scans.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Rebuilds lifecycle from the persisted `is_deleted` + `deleted_at` pair.
    ///
    /// Returns `None` when the two columns disagree.
    pub fn from_columns(is_deleted: i64, deleted_at: Option<i64>) -> Option<Self> {
        match (is_deleted, deleted_at) {
            (0, None) => Some(Self::Active),
            (1, Some(at)) => Some(Self::Deleted { at }),
            _ => None,
        }
    }
}

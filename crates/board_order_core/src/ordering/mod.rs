//! Positional ordering engine.
//!
//! # Responsibility
//! - Compute shift plans that keep positions dense inside one scope
//!   (items inside a container, containers inside a workspace).
//! - Stay storage-agnostic: every read/write goes through [`PositionStore`].
//!
//! # Invariants
//! - Active positions of a scope always form `1..=N` once a plan is applied.
//! - Plans only touch rows whose position actually changes.
//! - Callers run plan computation and application inside one transaction.

use crate::repo::{StoreError, StoreResult};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

pub mod allocator;
pub mod audit;
pub mod compaction;
mod plan;
pub mod reorder;

#[cfg(test)]
pub(crate) mod fake;

pub use plan::{Placement, PositionRange, PositionUpdate, Ranked};

/// Storage contract consumed by the ordering engine.
///
/// One implementation exists per ordered row kind; `Scope` is the unit the
/// density invariant applies to.
pub trait PositionStore {
    /// Ordering scope (container id for items, workspace id for containers).
    type Scope: Copy + Eq + Debug;
    /// Row identity.
    type Key: Copy + Eq + Debug;

    /// Counts active rows in `scope`.
    fn count_active(&self, scope: Self::Scope) -> StoreResult<i64>;

    /// Lists active rows of `scope` whose position lies in `range`,
    /// ascending by position.
    fn range_active(
        &self,
        scope: Self::Scope,
        range: PositionRange,
    ) -> StoreResult<Vec<Ranked<Self::Key>>>;

    /// Writes all updates. A row whose stored position differs from
    /// `update.from` fails the whole batch with [`StoreError::StaleRow`].
    fn apply_batch(&self, updates: &[PositionUpdate<Self::Key>]) -> StoreResult<()>;
}

pub type OrderingResult<T> = Result<T, OrderingError>;

/// Errors from plan computation.
#[derive(Debug)]
pub enum OrderingError {
    /// Requested position is outside `1..=max`.
    InvalidPosition { requested: i64, max: i64 },
    /// Underlying store failure.
    Store(StoreError),
}

impl Display for OrderingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPosition { requested, max } => {
                write!(f, "position {requested} is outside the allowed range 1..={max}")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for OrderingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPosition { .. } => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for OrderingError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

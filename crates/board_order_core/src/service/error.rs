//! Error taxonomy surfaced by the board service.

use crate::db::DbError;
use crate::model::item::{ContainerId, ItemId};
use crate::ordering::OrderingError;
use crate::repo::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type BoardResult<T> = Result<T, BoardError>;

/// Errors from board service operations.
#[derive(Debug)]
pub enum BoardError {
    /// Item does not exist or is soft-deleted.
    ItemNotFound(ItemId),
    /// Column does not exist or is soft-deleted.
    ContainerNotFound(ContainerId),
    /// Requested position is outside `1..=max`.
    InvalidPosition { requested: i64, max: i64 },
    /// Operation kept losing to concurrent writers.
    ConcurrentModification {
        operation: &'static str,
        attempts: u32,
    },
    /// Storage-level failure.
    Storage(StoreError),
}

impl BoardError {
    /// Returns whether a retry could succeed without caller changes.
    pub(crate) fn is_conflict(&self) -> bool {
        matches!(self, Self::Storage(err) if err.is_conflict())
    }
}

impl Display for BoardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ItemNotFound(id) => write!(f, "item not found: {id}"),
            Self::ContainerNotFound(id) => write!(f, "container not found: {id}"),
            Self::InvalidPosition { requested, max } => {
                write!(f, "position {requested} is outside the allowed range 1..={max}")
            }
            Self::ConcurrentModification {
                operation,
                attempts,
            } => write!(
                f,
                "{operation} aborted after {attempts} attempts due to concurrent modification"
            ),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BoardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for BoardError {
    fn from(value: StoreError) -> Self {
        Self::Storage(value)
    }
}

impl From<DbError> for BoardError {
    fn from(value: DbError) -> Self {
        Self::Storage(StoreError::Db(value))
    }
}

impl From<rusqlite::Error> for BoardError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(value.into())
    }
}

impl From<OrderingError> for BoardError {
    fn from(value: OrderingError) -> Self {
        match value {
            OrderingError::InvalidPosition { requested, max } => {
                Self::InvalidPosition { requested, max }
            }
            OrderingError::Store(err) => Self::Storage(err),
        }
    }
}

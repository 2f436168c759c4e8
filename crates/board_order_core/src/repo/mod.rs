//! Repository layer: SQLite implementations of the engine's store contracts.
//!
//! # Responsibility
//! - Keep SQL details out of the ordering engine and the service facade.
//! - Translate persisted rows into domain models, rejecting invalid data.
//!
//! # Invariants
//! - Ordering scans only ever see active (`is_deleted = 0`) rows.
//! - Repositories never open transactions; callers pass a connection that is
//!   already inside the write transaction.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod change_log_repo;
pub mod container_repo;
pub mod item_repo;
mod schema;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// A row no longer matches the state a write was planned against.
    StaleRow { table: &'static str, key: String },
    /// Persisted data cannot be converted to a valid model.
    InvalidData(String),
}

impl StoreError {
    /// Returns whether the failure is transient contention worth retrying.
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Db(err) => err.is_lock_contention(),
            Self::StaleRow { .. } => true,
            _ => false,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "board store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "board store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "board store requires column `{column}` in table `{table}`"
            ),
            Self::StaleRow { table, key } => {
                write!(f, "row `{key}` in `{table}` changed under a pending write")
            }
            Self::InvalidData(message) => write!(f, "invalid board data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

//! Transaction runner with bounded retry.
//!
//! # Invariants
//! - The connection lock is released before any backoff sleep.
//! - A failed attempt is fully rolled back before the next one starts.

use super::error::{BoardError, BoardResult};
use crate::config::RetryConfig;
use log::warn;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;

/// Locks the shared connection.
///
/// A poisoned lock is recovered: a panicking holder drops its transaction
/// during unwind, which rolls it back.
pub(crate) fn lock_connection(conn: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs `work` inside one `BEGIN IMMEDIATE` transaction and commits it.
pub(crate) fn run_write<T, F>(
    conn: &Mutex<Connection>,
    retry: &RetryConfig,
    operation: &'static str,
    work: F,
) -> BoardResult<T>
where
    F: FnMut(&Transaction<'_>) -> BoardResult<T>,
{
    run_with_behavior(conn, retry, operation, TransactionBehavior::Immediate, work)
}

/// Runs `work` inside one deferred (read) transaction.
pub(crate) fn run_read<T, F>(
    conn: &Mutex<Connection>,
    retry: &RetryConfig,
    operation: &'static str,
    work: F,
) -> BoardResult<T>
where
    F: FnMut(&Transaction<'_>) -> BoardResult<T>,
{
    run_with_behavior(conn, retry, operation, TransactionBehavior::Deferred, work)
}

fn run_with_behavior<T, F>(
    conn: &Mutex<Connection>,
    retry: &RetryConfig,
    operation: &'static str,
    behavior: TransactionBehavior,
    mut work: F,
) -> BoardResult<T>
where
    F: FnMut(&Transaction<'_>) -> BoardResult<T>,
{
    let mut conflicts = 0_u32;
    let mut storage_failures = 0_u32;

    loop {
        let outcome = {
            let mut guard = lock_connection(conn);
            attempt(&mut guard, behavior, &mut work)
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(err) if err.is_conflict() => {
                conflicts += 1;
                if conflicts >= retry.conflict_attempts {
                    warn!(
                        "event=tx_conflict module=service status=error operation={} attempts={} error={}",
                        operation, conflicts, err
                    );
                    return Err(BoardError::ConcurrentModification {
                        operation,
                        attempts: conflicts,
                    });
                }
                warn!(
                    "event=tx_conflict module=service status=retry operation={} attempt={} error={}",
                    operation, conflicts, err
                );
                thread::sleep(retry.conflict_backoff(conflicts));
            }
            Err(BoardError::Storage(err)) if storage_failures < retry.storage_retries => {
                storage_failures += 1;
                warn!(
                    "event=tx_storage_failure module=service status=retry operation={} attempt={} error={}",
                    operation, storage_failures, err
                );
            }
            Err(err) => return Err(err),
        }
    }
}

fn attempt<T, F>(
    conn: &mut Connection,
    behavior: TransactionBehavior,
    work: &mut F,
) -> BoardResult<T>
where
    F: FnMut(&Transaction<'_>) -> BoardResult<T>,
{
    let tx = conn.transaction_with_behavior(behavior)?;
    let value = work(&tx)?;
    tx.commit()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::run_write;
    use crate::config::RetryConfig;
    use crate::db::open_db_in_memory;
    use crate::repo::StoreError;
    use crate::service::error::BoardError;
    use std::cell::Cell;
    use std::sync::Mutex;

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            conflict_attempts: 3,
            conflict_backoff_ms: 0,
            storage_retries: 1,
            change_log_retries: 0,
        }
    }

    #[test]
    fn persistent_conflict_surfaces_as_concurrent_modification() {
        let conn = Mutex::new(open_db_in_memory().unwrap());
        let calls = Cell::new(0);
        let result: Result<(), _> = run_write(&conn, &fast_retry(), "probe", |_| {
            calls.set(calls.get() + 1);
            Err(BoardError::Storage(StoreError::StaleRow {
                table: "board_items",
                key: "k".to_string(),
            }))
        });

        assert!(matches!(
            result,
            Err(BoardError::ConcurrentModification {
                operation: "probe",
                attempts: 3
            })
        ));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn storage_failure_is_retried_once_then_surfaced() {
        let conn = Mutex::new(open_db_in_memory().unwrap());
        let calls = Cell::new(0);
        let result: Result<(), _> = run_write(&conn, &fast_retry(), "probe", |_| {
            calls.set(calls.get() + 1);
            Err(BoardError::Storage(StoreError::InvalidData("boom".to_string())))
        });

        assert!(matches!(result, Err(BoardError::Storage(_))));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn caller_errors_are_not_retried() {
        let conn = Mutex::new(open_db_in_memory().unwrap());
        let calls = Cell::new(0);
        let result: Result<(), _> = run_write(&conn, &fast_retry(), "probe", |_| {
            calls.set(calls.get() + 1);
            Err(BoardError::ContainerNotFound(7))
        });

        assert!(matches!(result, Err(BoardError::ContainerNotFound(7))));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn failed_attempt_rolls_back_its_writes() {
        let conn = Mutex::new(open_db_in_memory().unwrap());
        let result: Result<(), _> = run_write(&conn, &fast_retry(), "probe", |tx| {
            tx.execute(
                "INSERT INTO board_containers (workspace_id, name, position) VALUES (1, 'x', 1);",
                [],
            )?;
            Err(BoardError::ContainerNotFound(1))
        });
        assert!(result.is_err());

        let guard = conn.lock().unwrap();
        let count: i64 = guard
            .query_row("SELECT COUNT(*) FROM board_containers;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}

//! Post-commit change-log emission.
//!
//! Appends run in their own transaction after the primary mutation has
//! committed. Failures are retried, then dropped with a warning; they never
//! reach the caller.

use super::transaction::lock_connection;
use crate::model::change::ChangeEntry;
use crate::repo::change_log_repo::{ChangeLogRepository, SqliteChangeLogRepository};
use crate::repo::StoreResult;
use log::{debug, warn};
use rusqlite::{Connection, TransactionBehavior};
use std::sync::Mutex;

/// Appends `entries`, retrying up to `retries` extra times.
pub(crate) fn emit(conn: &Mutex<Connection>, retries: u32, entries: &[ChangeEntry]) {
    if entries.is_empty() {
        return;
    }

    let mut failures = 0_u32;
    loop {
        let outcome = {
            let mut guard = lock_connection(conn);
            append(&mut guard, entries)
        };

        match outcome {
            Ok(()) => {
                debug!(
                    "event=change_log_append module=service status=ok entries={}",
                    entries.len()
                );
                return;
            }
            Err(err) if failures < retries => {
                failures += 1;
                warn!(
                    "event=change_log_append module=service status=retry attempt={} error={}",
                    failures, err
                );
            }
            Err(err) => {
                warn!(
                    "event=change_log_append module=service status=error dropped={} item={} error={}",
                    entries.len(),
                    entries[0].item_id,
                    err
                );
                return;
            }
        }
    }
}

fn append(conn: &mut Connection, entries: &[ChangeEntry]) -> StoreResult<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    SqliteChangeLogRepository::new(&tx).append_all(entries)?;
    tx.commit()?;
    Ok(())
}

//! Append-only item change log.

use super::item_repo::parse_uuid;
use super::schema::ensure_table_ready;
use super::{StoreError, StoreResult};
use crate::model::change::{ChangeAction, ChangeEntry, ChangeRecord};
use crate::model::item::ItemId;
use rusqlite::{params, Connection, Row};

const CHANGE_LOG_COLUMNS: &[&str] = &[
    "id",
    "item_uuid",
    "actor_id",
    "action",
    "field_changed",
    "old_value",
    "new_value",
    "created_at",
];

/// Change-log persistence contract.
pub trait ChangeLogRepository {
    /// Appends entries in the given order.
    fn append_all(&self, entries: &[ChangeEntry]) -> StoreResult<()>;
    /// Lists every entry of one item, oldest first.
    fn list_for_item(&self, item_id: ItemId) -> StoreResult<Vec<ChangeRecord>>;
}

/// SQLite-backed change log.
pub struct SqliteChangeLogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteChangeLogRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_table_ready(conn, "item_change_log", CHANGE_LOG_COLUMNS)?;
        Ok(Self { conn })
    }

    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ChangeLogRepository for SqliteChangeLogRepository<'_> {
    fn append_all(&self, entries: &[ChangeEntry]) -> StoreResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO item_change_log (
                item_uuid,
                actor_id,
                action,
                field_changed,
                old_value,
                new_value
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        )?;
        for entry in entries {
            stmt.execute(params![
                entry.item_id.to_string(),
                entry.actor_id,
                entry.action.as_str(),
                entry.field.as_deref(),
                entry.old_value.as_deref(),
                entry.new_value.as_deref(),
            ])?;
        }
        Ok(())
    }

    fn list_for_item(&self, item_id: ItemId) -> StoreResult<Vec<ChangeRecord>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, item_uuid, actor_id, action, field_changed, old_value, new_value, created_at
             FROM item_change_log
             WHERE item_uuid = ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([item_id.to_string()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_change_row(row)?);
        }
        Ok(records)
    }
}

fn parse_change_row(row: &Row<'_>) -> StoreResult<ChangeRecord> {
    let uuid_text: String = row.get("item_uuid")?;
    let action_text: String = row.get("action")?;
    let action = ChangeAction::parse(&action_text).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "invalid action `{action_text}` in item_change_log.action"
        ))
    })?;

    Ok(ChangeRecord {
        id: row.get("id")?,
        item_id: parse_uuid(&uuid_text, "item_change_log.item_uuid")?,
        actor_id: row.get("actor_id")?,
        action,
        field: row.get("field_changed")?,
        old_value: row.get("old_value")?,
        new_value: row.get("new_value")?,
        created_at: row.get("created_at")?,
    })
}

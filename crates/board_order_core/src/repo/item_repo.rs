//! Item store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide range-scoped reads and guarded batched position writes over
//!   `board_items`.
//! - Persist item payloads and soft-delete tombstones.
//!
//! # Invariants
//! - Range scans are deterministic: `position ASC, uuid ASC`.
//! - Tombstones keep their last `container_id`/`position` untouched.

use super::schema::ensure_table_ready;
use super::{bool_to_int, StoreError, StoreResult};
use crate::model::item::{ActorId, ContainerId, Item, ItemId, ItemPayload};
use crate::model::lifecycle::Lifecycle;
use crate::ordering::{Placement, PositionRange, PositionStore, PositionUpdate, Ranked};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const ITEM_SELECT_SQL: &str = "SELECT
    uuid,
    container_id,
    position,
    title,
    description,
    status,
    priority,
    all_day,
    created_by,
    is_deleted,
    deleted_at,
    created_at,
    updated_at
FROM board_items";

const ITEM_COLUMNS: &[&str] = &[
    "uuid",
    "container_id",
    "position",
    "title",
    "description",
    "status",
    "priority",
    "all_day",
    "created_by",
    "is_deleted",
    "deleted_at",
    "created_at",
    "updated_at",
];

/// Item persistence contract used by the board service.
pub trait ItemStore: PositionStore<Scope = ContainerId, Key = ItemId> {
    /// Inserts one active item at `slot`.
    fn insert_item(
        &self,
        id: ItemId,
        slot: Placement<ContainerId>,
        payload: &ItemPayload,
        created_by: ActorId,
    ) -> StoreResult<()>;
    /// Loads one item by id.
    fn get_item(&self, id: ItemId, include_deleted: bool) -> StoreResult<Option<Item>>;
    /// Lists active items of one container in position order.
    fn list_active(&self, container_id: ContainerId) -> StoreResult<Vec<Item>>;
    /// Sets container and position of one active item.
    fn relocate(&self, id: ItemId, slot: Placement<ContainerId>) -> StoreResult<()>;
    /// Replaces the payload of one active item.
    fn update_payload(&self, id: ItemId, payload: &ItemPayload) -> StoreResult<()>;
    /// Tombstones one item. Returns `false` when it was already deleted.
    fn mark_deleted(&self, id: ItemId) -> StoreResult<bool>;
}

/// SQLite-backed item store.
pub struct SqliteItemStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemStore<'conn> {
    /// Creates store from a migrated connection, verifying the schema.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_table_ready(conn, "board_items", ITEM_COLUMNS)?;
        Ok(Self { conn })
    }

    /// Creates store without schema checks; used inside transactions whose
    /// connection was verified at service construction.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PositionStore for SqliteItemStore<'_> {
    type Scope = ContainerId;
    type Key = ItemId;

    fn count_active(&self, container_id: ContainerId) -> StoreResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*)
             FROM board_items
             WHERE container_id = ?1
               AND is_deleted = 0;",
            [container_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn range_active(
        &self,
        container_id: ContainerId,
        range: PositionRange,
    ) -> StoreResult<Vec<Ranked<ItemId>>> {
        let (min, max) = range.inclusive_bounds();
        let mut stmt = self.conn.prepare_cached(
            "SELECT uuid, position
             FROM board_items
             WHERE container_id = ?1
               AND is_deleted = 0
               AND position BETWEEN ?2 AND ?3
             ORDER BY position ASC, uuid ASC;",
        )?;
        let mut rows = stmt.query(params![container_id, min, max])?;
        let mut ranked = Vec::new();
        while let Some(row) = rows.next()? {
            let uuid_text: String = row.get(0)?;
            ranked.push(Ranked {
                key: parse_uuid(&uuid_text, "board_items.uuid")?,
                position: row.get(1)?,
            });
        }
        Ok(ranked)
    }

    fn apply_batch(&self, updates: &[PositionUpdate<ItemId>]) -> StoreResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "UPDATE board_items
             SET position = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND position = ?2
               AND is_deleted = 0;",
        )?;
        for update in updates {
            let changed = stmt.execute(params![update.key.to_string(), update.from, update.to])?;
            if changed == 0 {
                return Err(StoreError::StaleRow {
                    table: "board_items",
                    key: update.key.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl ItemStore for SqliteItemStore<'_> {
    fn insert_item(
        &self,
        id: ItemId,
        slot: Placement<ContainerId>,
        payload: &ItemPayload,
        created_by: ActorId,
    ) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO board_items (
                uuid,
                container_id,
                position,
                title,
                description,
                status,
                priority,
                all_day,
                created_by,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0);",
            params![
                id.to_string(),
                slot.scope,
                slot.position,
                payload.title.as_str(),
                payload.description.as_str(),
                payload.status.as_str(),
                payload.priority.as_str(),
                bool_to_int(payload.all_day),
                created_by,
            ],
        )?;
        Ok(())
    }

    fn get_item(&self, id: ItemId, include_deleted: bool) -> StoreResult<Option<Item>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{ITEM_SELECT_SQL}
             WHERE uuid = ?1
               AND (?2 = 1 OR is_deleted = 0);"
        ))?;
        let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_item_row(row)?));
        }
        Ok(None)
    }

    fn list_active(&self, container_id: ContainerId) -> StoreResult<Vec<Item>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{ITEM_SELECT_SQL}
             WHERE container_id = ?1
               AND is_deleted = 0
             ORDER BY position ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([container_id])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }
        Ok(items)
    }

    fn relocate(&self, id: ItemId, slot: Placement<ContainerId>) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE board_items
             SET container_id = ?2,
                 position = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            params![id.to_string(), slot.scope, slot.position],
        )?;
        if changed == 0 {
            return Err(StoreError::StaleRow {
                table: "board_items",
                key: id.to_string(),
            });
        }
        Ok(())
    }

    fn update_payload(&self, id: ItemId, payload: &ItemPayload) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE board_items
             SET title = ?2,
                 description = ?3,
                 status = ?4,
                 priority = ?5,
                 all_day = ?6,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            params![
                id.to_string(),
                payload.title.as_str(),
                payload.description.as_str(),
                payload.status.as_str(),
                payload.priority.as_str(),
                bool_to_int(payload.all_day),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::StaleRow {
                table: "board_items",
                key: id.to_string(),
            });
        }
        Ok(())
    }

    fn mark_deleted(&self, id: ItemId) -> StoreResult<bool> {
        let changed = self.conn.execute(
            "UPDATE board_items
             SET is_deleted = 1,
                 deleted_at = (strftime('%s', 'now') * 1000),
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            [id.to_string()],
        )?;
        Ok(changed > 0)
    }
}

fn parse_item_row(row: &Row<'_>) -> StoreResult<Item> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text, "board_items.uuid")?;

    let is_deleted: i64 = row.get("is_deleted")?;
    let deleted_at: Option<i64> = row.get("deleted_at")?;
    let lifecycle = Lifecycle::from_columns(is_deleted, deleted_at).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "inconsistent tombstone (is_deleted={is_deleted}, deleted_at={deleted_at:?}) for item {id}"
        ))
    })?;

    let all_day = match row.get::<_, i64>("all_day")? {
        0 => false,
        1 => true,
        other => {
            return Err(StoreError::InvalidData(format!(
                "invalid all_day value `{other}` in board_items.all_day"
            )));
        }
    };

    Ok(Item {
        id,
        container_id: row.get("container_id")?,
        position: row.get("position")?,
        payload: ItemPayload {
            title: row.get("title")?,
            description: row.get("description")?,
            status: row.get("status")?,
            priority: row.get("priority")?,
            all_day,
        },
        created_by: row.get("created_by")?,
        lifecycle,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub(super) fn parse_uuid(value: &str, column: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| StoreError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

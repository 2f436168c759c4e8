//! Board column store contract and SQLite implementation.
//!
//! # Responsibility
//! - Order columns inside one workspace through [`PositionStore`].
//! - Persist column rows and soft-delete tombstones.
//!
//! # Invariants
//! - Deleting a column never touches its items.

use super::schema::ensure_table_ready;
use super::{StoreError, StoreResult};
use crate::model::container::Container;
use crate::model::item::{ContainerId, WorkspaceId};
use crate::model::lifecycle::Lifecycle;
use crate::ordering::{Placement, PositionRange, PositionStore, PositionUpdate, Ranked};
use rusqlite::{params, Connection, Row};

const CONTAINER_SELECT_SQL: &str = "SELECT
    id,
    workspace_id,
    name,
    position,
    is_deleted,
    deleted_at,
    created_at,
    updated_at
FROM board_containers";

const CONTAINER_COLUMNS: &[&str] = &[
    "id",
    "workspace_id",
    "name",
    "position",
    "is_deleted",
    "deleted_at",
    "created_at",
    "updated_at",
];

/// Column persistence contract used by the board service.
pub trait ContainerStore: PositionStore<Scope = WorkspaceId, Key = ContainerId> {
    /// Inserts one active column and returns its id.
    fn insert_container(&self, slot: Placement<WorkspaceId>, name: &str)
        -> StoreResult<ContainerId>;
    fn get_container(&self, id: ContainerId, include_deleted: bool)
        -> StoreResult<Option<Container>>;
    /// Lists active columns of one workspace in position order.
    fn list_active(&self, workspace_id: WorkspaceId) -> StoreResult<Vec<Container>>;
    /// Sets the position of one active column.
    fn set_position(&self, id: ContainerId, position: i64) -> StoreResult<()>;
    /// Tombstones one column. Returns `false` when it was already deleted.
    fn mark_deleted(&self, id: ContainerId) -> StoreResult<bool>;
}

/// SQLite-backed column store.
pub struct SqliteContainerStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContainerStore<'conn> {
    /// Creates store from a migrated connection, verifying the schema.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_table_ready(conn, "board_containers", CONTAINER_COLUMNS)?;
        Ok(Self { conn })
    }

    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PositionStore for SqliteContainerStore<'_> {
    type Scope = WorkspaceId;
    type Key = ContainerId;

    fn count_active(&self, workspace_id: WorkspaceId) -> StoreResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*)
             FROM board_containers
             WHERE workspace_id = ?1
               AND is_deleted = 0;",
            [workspace_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn range_active(
        &self,
        workspace_id: WorkspaceId,
        range: PositionRange,
    ) -> StoreResult<Vec<Ranked<ContainerId>>> {
        let (min, max) = range.inclusive_bounds();
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, position
             FROM board_containers
             WHERE workspace_id = ?1
               AND is_deleted = 0
               AND position BETWEEN ?2 AND ?3
             ORDER BY position ASC, id ASC;",
        )?;
        let ranked = stmt
            .query_map(params![workspace_id, min, max], |row| {
                Ok(Ranked {
                    key: row.get(0)?,
                    position: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ranked)
    }

    fn apply_batch(&self, updates: &[PositionUpdate<ContainerId>]) -> StoreResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "UPDATE board_containers
             SET position = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND position = ?2
               AND is_deleted = 0;",
        )?;
        for update in updates {
            if stmt.execute(params![update.key, update.from, update.to])? == 0 {
                return Err(StoreError::StaleRow {
                    table: "board_containers",
                    key: update.key.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl ContainerStore for SqliteContainerStore<'_> {
    fn insert_container(
        &self,
        slot: Placement<WorkspaceId>,
        name: &str,
    ) -> StoreResult<ContainerId> {
        self.conn.execute(
            "INSERT INTO board_containers (workspace_id, name, position, is_deleted)
             VALUES (?1, ?2, ?3, 0);",
            params![slot.scope, name, slot.position],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_container(
        &self,
        id: ContainerId,
        include_deleted: bool,
    ) -> StoreResult<Option<Container>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{CONTAINER_SELECT_SQL}
             WHERE id = ?1;"
        ))?;
        let mut rows = stmt.query([id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let container = parse_container_row(row)?;
        if !include_deleted && !container.is_active() {
            return Ok(None);
        }
        Ok(Some(container))
    }

    fn list_active(&self, workspace_id: WorkspaceId) -> StoreResult<Vec<Container>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{CONTAINER_SELECT_SQL}
             WHERE workspace_id = ?1
               AND is_deleted = 0
             ORDER BY position ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([workspace_id])?;
        let mut containers = Vec::new();
        while let Some(row) = rows.next()? {
            containers.push(parse_container_row(row)?);
        }
        Ok(containers)
    }

    fn set_position(&self, id: ContainerId, position: i64) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE board_containers
             SET position = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND is_deleted = 0;",
            params![id, position],
        )?;
        if changed == 0 {
            return Err(StoreError::StaleRow {
                table: "board_containers",
                key: id.to_string(),
            });
        }
        Ok(())
    }

    fn mark_deleted(&self, id: ContainerId) -> StoreResult<bool> {
        let changed = self.conn.execute(
            "UPDATE board_containers
             SET is_deleted = 1,
                 deleted_at = (strftime('%s', 'now') * 1000),
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND is_deleted = 0;",
            [id],
        )?;
        Ok(changed > 0)
    }
}

fn parse_container_row(row: &Row<'_>) -> StoreResult<Container> {
    let id: ContainerId = row.get("id")?;
    let is_deleted: i64 = row.get("is_deleted")?;
    let deleted_at: Option<i64> = row.get("deleted_at")?;
    let lifecycle = Lifecycle::from_columns(is_deleted, deleted_at).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "inconsistent tombstone (is_deleted={is_deleted}, deleted_at={deleted_at:?}) for column {id}"
        ))
    })?;

    Ok(Container {
        id,
        workspace_id: row.get("workspace_id")?,
        name: row.get("name")?,
        position: row.get("position")?,
        lifecycle,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

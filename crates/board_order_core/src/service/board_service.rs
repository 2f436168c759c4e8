//! Board use-case service.
//!
//! # Responsibility
//! - Expose item and column operations that keep positions dense.
//! - Run every read-compute-write sequence inside one immediate transaction.
//! - Emit item change-log entries after the primary commit.
//!
//! # Invariants
//! - Active positions of each column (items) and each workspace (columns)
//!   form `1..=N` after every committed operation.
//! - Shifted neighbours never produce change-log entries.
//! - No-op mutations perform no writes.

use super::change_log;
use super::error::{BoardError, BoardResult};
use super::transaction::{run_read, run_write};
use crate::config::{EngineConfig, RetryConfig};
use crate::db::{open_db_in_memory, open_db_with_busy_timeout};
use crate::model::change::{ChangeAction, ChangeEntry, ChangeRecord, ChangeSet};
use crate::model::container::Container;
use crate::model::item::{ActorId, ContainerId, Item, ItemId, ItemPatch, ItemPayload, WorkspaceId};
use crate::ordering::allocator::allocate;
use crate::ordering::audit::{audit_scope, DensityReport};
use crate::ordering::compaction::plan_compaction;
use crate::ordering::reorder::plan_move;
use crate::ordering::{Placement, PositionStore};
use crate::repo::change_log_repo::{ChangeLogRepository, SqliteChangeLogRepository};
use crate::repo::container_repo::{ContainerStore, SqliteContainerStore};
use crate::repo::item_repo::{ItemStore, SqliteItemStore};
use log::info;
use rusqlite::Connection;
use std::sync::Mutex;
use uuid::Uuid;

/// Board service facade shared between request threads.
pub struct BoardService {
    conn: Mutex<Connection>,
    retry: RetryConfig,
}

impl BoardService {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `Storage` when the connection schema is not ready.
    pub fn new(conn: Connection, retry: RetryConfig) -> BoardResult<Self> {
        SqliteContainerStore::try_new(&conn)?;
        SqliteItemStore::try_new(&conn)?;
        SqliteChangeLogRepository::try_new(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            retry,
        })
    }

    /// Opens the configured database (in-memory when no path is set).
    pub fn open(config: &EngineConfig) -> BoardResult<Self> {
        let conn = match &config.database_path {
            Some(path) => open_db_with_busy_timeout(path, config.busy_timeout())?,
            None => open_db_in_memory()?,
        };
        Self::new(conn, config.retry.clone())
    }

    /// Creates an active column at the end of `workspace_id`.
    pub fn create_container(
        &self,
        workspace_id: WorkspaceId,
        name: &str,
    ) -> BoardResult<Container> {
        let container = run_write(&self.conn, &self.retry, "create_container", |tx| {
            let containers = SqliteContainerStore::new(tx);
            let position = allocate(&containers, workspace_id)?;
            let id = containers.insert_container(
                Placement {
                    scope: workspace_id,
                    position,
                },
                name,
            )?;
            load_container(&containers, id)
        })?;
        info!(
            "event=container_create module=service status=ok container={} workspace={} position={}",
            container.id, container.workspace_id, container.position
        );
        Ok(container)
    }

    /// Reorders one column inside its workspace.
    ///
    /// # Errors
    /// - `ContainerNotFound` when the column is missing or deleted.
    /// - `InvalidPosition` when `dest_position` is outside `1..=active count`.
    pub fn move_container(
        &self,
        container_id: ContainerId,
        dest_position: i64,
    ) -> BoardResult<Container> {
        run_write(&self.conn, &self.retry, "move_container", |tx| {
            let containers = SqliteContainerStore::new(tx);
            let container = load_container(&containers, container_id)?;
            let plan = plan_move(
                &containers,
                container.placement(),
                container.workspace_id,
                dest_position,
            )?;
            if plan.is_noop() {
                return Ok(container);
            }

            containers.apply_batch(&plan.shifts)?;
            containers.set_position(container_id, plan.to.position)?;
            info!(
                "event=container_move module=service status=ok container={} from_position={} to_position={} shifted={}",
                container_id,
                plan.from.position,
                plan.to.position,
                plan.shifts.len()
            );
            load_container(&containers, container_id)
        })
    }

    /// Soft-deletes one column and closes the gap among its siblings.
    ///
    /// Items of the column are left untouched. Deleting an already deleted
    /// column is a no-op.
    pub fn delete_container(&self, container_id: ContainerId) -> BoardResult<()> {
        run_write(&self.conn, &self.retry, "delete_container", |tx| {
            let containers = SqliteContainerStore::new(tx);
            let container = containers
                .get_container(container_id, true)?
                .ok_or(BoardError::ContainerNotFound(container_id))?;
            if !container.is_active() || !containers.mark_deleted(container_id)? {
                return Ok(());
            }

            let shifts = plan_compaction(&containers, container.placement())?;
            containers.apply_batch(&shifts)?;
            info!(
                "event=container_delete module=service status=ok container={} position={} shifted={}",
                container_id,
                container.position,
                shifts.len()
            );
            Ok(())
        })
    }

    /// Gets one active column.
    pub fn get_container(&self, container_id: ContainerId) -> BoardResult<Option<Container>> {
        run_read(&self.conn, &self.retry, "get_container", |tx| {
            Ok(SqliteContainerStore::new(tx).get_container(container_id, false)?)
        })
    }

    /// Lists active columns of one workspace in position order.
    pub fn list_containers(&self, workspace_id: WorkspaceId) -> BoardResult<Vec<Container>> {
        run_read(&self.conn, &self.retry, "list_containers", |tx| {
            Ok(SqliteContainerStore::new(tx).list_active(workspace_id)?)
        })
    }

    /// Creates an item at the end of `container_id`.
    ///
    /// # Errors
    /// - `ContainerNotFound` when the column is missing or deleted.
    pub fn create_item(
        &self,
        container_id: ContainerId,
        payload: &ItemPayload,
        actor_id: ActorId,
    ) -> BoardResult<Item> {
        let item = run_write(&self.conn, &self.retry, "create_item", |tx| {
            load_container(&SqliteContainerStore::new(tx), container_id)?;

            let items = SqliteItemStore::new(tx);
            let slot = Placement {
                scope: container_id,
                position: allocate(&items, container_id)?,
            };
            let id = Uuid::new_v4();
            items.insert_item(id, slot, payload, actor_id)?;
            load_item(&items, id)
        })?;

        info!(
            "event=item_create module=service status=ok item={} container={} position={}",
            item.id, item.container_id, item.position
        );
        self.emit_changes(&[ChangeEntry::lifecycle(
            item.id,
            actor_id,
            ChangeAction::Create,
        )]);
        Ok(item)
    }

    /// Moves an item to `dest_position` in `dest_container`.
    ///
    /// Same-column targets must lie in `1..=active count`. Cross-column
    /// targets insert before the row at `dest_position`; targets past the end
    /// are clamped to append.
    ///
    /// # Errors
    /// - `ItemNotFound` / `ContainerNotFound` for missing or deleted rows.
    /// - `ContainerNotFound` when the destination lies in another workspace.
    /// - `InvalidPosition` for out-of-range targets.
    pub fn move_item(
        &self,
        item_id: ItemId,
        dest_container: ContainerId,
        dest_position: i64,
        actor_id: ActorId,
    ) -> BoardResult<Item> {
        let (item, changes) = run_write(&self.conn, &self.retry, "move_item", |tx| {
            let items = SqliteItemStore::new(tx);
            let item = load_item(&items, item_id)?;
            let containers = SqliteContainerStore::new(tx);
            let dest = load_container(&containers, dest_container)?;
            let source = containers
                .get_container(item.container_id, true)?
                .ok_or(BoardError::ContainerNotFound(item.container_id))?;
            if source.workspace_id != dest.workspace_id {
                return Err(BoardError::ContainerNotFound(dest_container));
            }

            let mut changes = ChangeSet::new(item_id, actor_id, ChangeAction::Update);
            let plan = plan_move(&items, item.placement(), dest_container, dest_position)?;
            if plan.is_noop() {
                return Ok((item, changes));
            }

            items.apply_batch(&plan.shifts)?;
            items.relocate(item_id, plan.to)?;
            changes.record("container_id", &plan.from.scope, &plan.to.scope);
            changes.record("position", &plan.from.position, &plan.to.position);
            info!(
                "event=item_move module=service status=ok item={} cross_column={} from={}:{} to={}:{} shifted={}",
                item_id,
                plan.crosses_scope(),
                plan.from.scope,
                plan.from.position,
                plan.to.scope,
                plan.to.position,
                plan.shifts.len()
            );
            Ok((load_item(&items, item_id)?, changes))
        })?;

        self.emit_changes(changes.entries());
        Ok(item)
    }

    /// Soft-deletes an item and closes the gap in its column.
    ///
    /// The tombstone keeps its last position. Deleting an already deleted
    /// item is a no-op.
    pub fn delete_item(&self, item_id: ItemId, actor_id: ActorId) -> BoardResult<()> {
        let deleted = run_write(&self.conn, &self.retry, "delete_item", |tx| {
            let items = SqliteItemStore::new(tx);
            let item = items
                .get_item(item_id, true)?
                .ok_or(BoardError::ItemNotFound(item_id))?;
            if !item.is_active() || !items.mark_deleted(item_id)? {
                return Ok(false);
            }

            let shifts = plan_compaction(&items, item.placement())?;
            items.apply_batch(&shifts)?;
            info!(
                "event=item_delete module=service status=ok item={} container={} position={} shifted={}",
                item_id,
                item.container_id,
                item.position,
                shifts.len()
            );
            Ok(true)
        })?;

        if deleted {
            self.emit_changes(&[ChangeEntry::lifecycle(
                item_id,
                actor_id,
                ChangeAction::Delete,
            )]);
        }
        Ok(())
    }

    /// Applies present patch fields to an active item.
    ///
    /// A patch that changes nothing performs no write.
    pub fn update_item(
        &self,
        item_id: ItemId,
        patch: &ItemPatch,
        actor_id: ActorId,
    ) -> BoardResult<Item> {
        let (item, changes) = run_write(&self.conn, &self.retry, "update_item", |tx| {
            let items = SqliteItemStore::new(tx);
            let item = load_item(&items, item_id)?;
            let mut changes = ChangeSet::new(item_id, actor_id, ChangeAction::Update);
            if patch.is_empty() {
                return Ok((item, changes));
            }

            let payload = patch.apply_to(&item.payload, &mut changes);
            if changes.entries().is_empty() {
                return Ok((item, changes));
            }
            items.update_payload(item_id, &payload)?;
            Ok((load_item(&items, item_id)?, changes))
        })?;

        if !changes.entries().is_empty() {
            info!(
                "event=item_update module=service status=ok item={} fields={}",
                item_id,
                changes.entries().len()
            );
        }
        self.emit_changes(changes.entries());
        Ok(item)
    }

    /// Gets one item, optionally including tombstones.
    pub fn get_item(&self, item_id: ItemId, include_deleted: bool) -> BoardResult<Option<Item>> {
        run_read(&self.conn, &self.retry, "get_item", |tx| {
            Ok(SqliteItemStore::new(tx).get_item(item_id, include_deleted)?)
        })
    }

    /// Lists active items of an active column in position order.
    pub fn list_items(&self, container_id: ContainerId) -> BoardResult<Vec<Item>> {
        run_read(&self.conn, &self.retry, "list_items", |tx| {
            load_container(&SqliteContainerStore::new(tx), container_id)?;
            Ok(SqliteItemStore::new(tx).list_active(container_id)?)
        })
    }

    /// Lists change-log entries of one item (tombstones included), oldest first.
    pub fn item_history(&self, item_id: ItemId) -> BoardResult<Vec<ChangeRecord>> {
        run_read(&self.conn, &self.retry, "item_history", |tx| {
            SqliteItemStore::new(tx)
                .get_item(item_id, true)?
                .ok_or(BoardError::ItemNotFound(item_id))?;
            Ok(SqliteChangeLogRepository::new(tx).list_for_item(item_id)?)
        })
    }

    /// Checks item density of one column, deleted columns included.
    pub fn audit_container(&self, container_id: ContainerId) -> BoardResult<DensityReport> {
        run_read(&self.conn, &self.retry, "audit_container", |tx| {
            SqliteContainerStore::new(tx)
                .get_container(container_id, true)?
                .ok_or(BoardError::ContainerNotFound(container_id))?;
            Ok(audit_scope(&SqliteItemStore::new(tx), container_id)?)
        })
    }

    /// Checks column density of one workspace.
    pub fn audit_workspace(&self, workspace_id: WorkspaceId) -> BoardResult<DensityReport> {
        run_read(&self.conn, &self.retry, "audit_workspace", |tx| {
            Ok(audit_scope(&SqliteContainerStore::new(tx), workspace_id)?)
        })
    }

    fn emit_changes(&self, entries: &[ChangeEntry]) {
        change_log::emit(&self.conn, self.retry.change_log_retries, entries);
    }
}

fn load_container<S: ContainerStore>(store: &S, id: ContainerId) -> BoardResult<Container> {
    store
        .get_container(id, false)?
        .ok_or(BoardError::ContainerNotFound(id))
}

fn load_item<S: ItemStore>(store: &S, id: ItemId) -> BoardResult<Item> {
    store.get_item(id, false)?.ok_or(BoardError::ItemNotFound(id))
}

#[cfg(test)]
mod tests {
    use super::BoardService;
    use crate::config::EngineConfig;
    use crate::model::item::ItemPayload;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn service_is_shareable_across_threads() {
        assert_send_sync::<BoardService>();
    }

    #[test]
    fn open_without_path_uses_memory_database() {
        let service = BoardService::open(&EngineConfig::default()).unwrap();
        let column = service.create_container(1, "todo").unwrap();
        let item = service
            .create_item(column.id, &ItemPayload::titled("first"), 9)
            .unwrap();
        assert_eq!(item.position, 1);
        assert_eq!(item.created_by, 9);
    }
}

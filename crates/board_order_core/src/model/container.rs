//! Board column model.

use crate::model::item::{ContainerId, WorkspaceId};
use crate::model::lifecycle::Lifecycle;
use crate::ordering::Placement;
use serde::{Deserialize, Serialize};

/// Board column holding an ordered list of items.
///
/// Columns are themselves ordered among the active columns of one workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub id: ContainerId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub position: i64,
    pub lifecycle: Lifecycle,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Container {
    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    /// Returns the column's slot inside its workspace.
    pub fn placement(&self) -> Placement<WorkspaceId> {
        Placement {
            scope: self.workspace_id,
            position: self.position,
        }
    }
}

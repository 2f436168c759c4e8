//! Board item (schedule card) model.
//!
//! # Responsibility
//! - Define the positioned card record and its opaque payload.
//! - Model partial updates as an explicit patch with apply-if-present fields.
//!
//! # Invariants
//! - `position` is a 1-based rank among active items of `container_id`.
//! - Payload fields never influence ordering.

use crate::model::change::ChangeSet;
use crate::model::lifecycle::Lifecycle;
use crate::ordering::Placement;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable item identifier.
pub type ItemId = Uuid;
/// Board column identifier (store-assigned integer).
pub type ContainerId = i64;
/// Workspace identifier owned by the external workspace service.
pub type WorkspaceId = i64;
/// Workspace user performing a mutation.
pub type ActorId = i64;

/// Card payload carried through the engine untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPayload {
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub all_day: bool,
}

impl ItemPayload {
    /// Creates a payload with only a title set.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Positioned card record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub container_id: ContainerId,
    pub position: i64,
    #[serde(flatten)]
    pub payload: ItemPayload,
    pub created_by: ActorId,
    pub lifecycle: Lifecycle,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

impl Item {
    /// Returns whether this item takes part in ordering scans.
    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    /// Returns the item's current slot.
    pub fn placement(&self) -> Placement<ContainerId> {
        Placement {
            scope: self.container_id,
            position: self.position,
        }
    }
}

/// Partial payload update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub all_day: Option<bool>,
}

impl ItemPatch {
    /// Returns whether the patch carries no field at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.all_day.is_none()
    }

    /// Applies present fields to a copy of `current`.
    ///
    /// Every field whose value actually changes is recorded in `changes`.
    pub fn apply_to(&self, current: &ItemPayload, changes: &mut ChangeSet) -> ItemPayload {
        let mut next = current.clone();
        patch_field("title", &mut next.title, &self.title, changes);
        patch_field("description", &mut next.description, &self.description, changes);
        patch_field("status", &mut next.status, &self.status, changes);
        patch_field("priority", &mut next.priority, &self.priority, changes);
        patch_field("all_day", &mut next.all_day, &self.all_day, changes);
        next
    }
}

fn patch_field<T>(field: &'static str, slot: &mut T, value: &Option<T>, changes: &mut ChangeSet)
where
    T: Clone + PartialEq + ToString,
{
    if let Some(value) = value {
        changes.record(field, &*slot, value);
        *slot = value.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::{ItemPatch, ItemPayload};
    use crate::model::change::{ChangeAction, ChangeSet};
    use uuid::Uuid;

    #[test]
    fn patch_records_only_changed_fields() {
        let current = ItemPayload {
            title: "Standup".to_string(),
            status: "todo".to_string(),
            ..ItemPayload::default()
        };
        let patch = ItemPatch {
            title: Some("Standup".to_string()),
            status: Some("done".to_string()),
            all_day: Some(true),
            ..ItemPatch::default()
        };
        let mut changes = ChangeSet::new(Uuid::new_v4(), 7, ChangeAction::Update);

        let next = patch.apply_to(&current, &mut changes);

        assert_eq!(next.title, "Standup");
        assert_eq!(next.status, "done");
        assert!(next.all_day);
        let fields: Vec<_> = changes
            .entries()
            .iter()
            .map(|entry| entry.field.as_deref().unwrap_or_default().to_string())
            .collect();
        assert_eq!(fields, vec!["status", "all_day"]);
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(ItemPatch::default().is_empty());
        let patch = ItemPatch {
            priority: Some("high".to_string()),
            ..ItemPatch::default()
        };
        assert!(!patch.is_empty());
    }
}

//! Item change-log records.
//!
//! # Responsibility
//! - Describe before/after values of mutated item fields for audit consumers.
//! - Collect field diffs during one mutation without logging unchanged values.
//!
//! # Invariants
//! - A field entry is produced only when `old_value != new_value`.
//! - Create/delete entries carry no field.

use crate::model::item::{ActorId, ItemId};
use serde::{Deserialize, Serialize};

/// Kind of mutation a change entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// Change entry waiting to be appended to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEntry {
    pub item_id: ItemId,
    pub actor_id: ActorId,
    pub action: ChangeAction,
    pub field: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl ChangeEntry {
    /// Entry for a whole-item event (create/delete).
    pub fn lifecycle(item_id: ItemId, actor_id: ActorId, action: ChangeAction) -> Self {
        Self {
            item_id,
            actor_id,
            action,
            field: None,
            old_value: None,
            new_value: None,
        }
    }
}

/// Persisted change-log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub id: i64,
    pub item_id: ItemId,
    pub actor_id: ActorId,
    pub action: ChangeAction,
    pub field: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    /// Epoch ms append timestamp.
    pub created_at: i64,
}

/// Field diffs gathered while one mutation is computed.
#[derive(Debug, Clone)]
pub struct ChangeSet {
    item_id: ItemId,
    actor_id: ActorId,
    action: ChangeAction,
    entries: Vec<ChangeEntry>,
}

impl ChangeSet {
    pub fn new(item_id: ItemId, actor_id: ActorId, action: ChangeAction) -> Self {
        Self {
            item_id,
            actor_id,
            action,
            entries: Vec::new(),
        }
    }

    /// Records `field` when `old != new`; equal values are dropped.
    pub fn record<T>(&mut self, field: &'static str, old: &T, new: &T)
    where
        T: PartialEq + ToString + ?Sized,
    {
        if old == new {
            return;
        }
        self.entries.push(ChangeEntry {
            item_id: self.item_id,
            actor_id: self.actor_id,
            action: self.action,
            field: Some(field.to_string()),
            old_value: Some(old.to_string()),
            new_value: Some(new.to_string()),
        });
    }

    pub fn entries(&self) -> &[ChangeEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangeAction, ChangeSet};
    use uuid::Uuid;

    #[test]
    fn equal_values_are_not_recorded() {
        let mut changes = ChangeSet::new(Uuid::new_v4(), 1, ChangeAction::Update);
        changes.record("position", &3_i64, &3_i64);
        assert!(changes.entries().is_empty());

        changes.record("position", &3_i64, &1_i64);
        let entries = changes.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].field.as_deref(), Some("position"));
        assert_eq!(entries[0].old_value.as_deref(), Some("3"));
        assert_eq!(entries[0].new_value.as_deref(), Some("1"));
    }

    #[test]
    fn action_roundtrips_through_text() {
        for action in [ChangeAction::Create, ChangeAction::Update, ChangeAction::Delete] {
            assert_eq!(ChangeAction::parse(action.as_str()), Some(action));
        }
        assert_eq!(ChangeAction::parse("rename"), None);
    }
}

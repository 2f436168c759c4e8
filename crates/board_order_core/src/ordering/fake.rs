//! Vector-backed [`PositionStore`] used by engine unit tests.

use super::{PositionRange, PositionStore, PositionUpdate, Ranked};
use crate::repo::{StoreError, StoreResult};
use std::cell::RefCell;
use std::ops::RangeBounds;

#[derive(Debug, Clone, Copy)]
struct Row {
    scope: i64,
    key: char,
    position: i64,
    active: bool,
}

#[derive(Debug, Default)]
pub(crate) struct VecStore {
    rows: RefCell<Vec<Row>>,
}

impl VecStore {
    /// Builds a scope holding `keys` at positions `1..`.
    pub(crate) fn with_scope(self, scope: i64, keys: &str) -> Self {
        {
            let mut rows = self.rows.borrow_mut();
            for (index, key) in keys.chars().enumerate() {
                rows.push(Row {
                    scope,
                    key,
                    position: index as i64 + 1,
                    active: true,
                });
            }
        }
        self
    }

    pub(crate) fn deactivate(&self, key: char) {
        for row in self.rows.borrow_mut().iter_mut() {
            if row.key == key {
                row.active = false;
            }
        }
    }

    pub(crate) fn place(&self, key: char, scope: i64, position: i64) {
        for row in self.rows.borrow_mut().iter_mut() {
            if row.key == key {
                row.scope = scope;
                row.position = position;
            }
        }
    }

    /// Active keys of `scope` in position order.
    pub(crate) fn order(&self, scope: i64) -> String {
        let mut rows: Vec<Row> = self
            .rows
            .borrow()
            .iter()
            .filter(|row| row.active && row.scope == scope)
            .copied()
            .collect();
        rows.sort_by_key(|row| row.position);
        rows.into_iter().map(|row| row.key).collect()
    }

    /// Active positions of `scope`, ascending.
    pub(crate) fn positions(&self, scope: i64) -> Vec<i64> {
        let mut positions: Vec<i64> = self
            .rows
            .borrow()
            .iter()
            .filter(|row| row.active && row.scope == scope)
            .map(|row| row.position)
            .collect();
        positions.sort_unstable();
        positions
    }
}

impl PositionStore for VecStore {
    type Scope = i64;
    type Key = char;

    fn count_active(&self, scope: i64) -> StoreResult<i64> {
        Ok(self
            .rows
            .borrow()
            .iter()
            .filter(|row| row.active && row.scope == scope)
            .count() as i64)
    }

    fn range_active(&self, scope: i64, range: PositionRange) -> StoreResult<Vec<Ranked<char>>> {
        let mut ranked: Vec<Ranked<char>> = self
            .rows
            .borrow()
            .iter()
            .filter(|row| row.active && row.scope == scope && range.contains(&row.position))
            .map(|row| Ranked {
                key: row.key,
                position: row.position,
            })
            .collect();
        ranked.sort_by_key(|row| row.position);
        Ok(ranked)
    }

    fn apply_batch(&self, updates: &[PositionUpdate<char>]) -> StoreResult<()> {
        let mut rows = self.rows.borrow_mut();
        for update in updates {
            let row = rows
                .iter_mut()
                .find(|row| row.key == update.key && row.active && row.position == update.from)
                .ok_or_else(|| StoreError::StaleRow {
                    table: "fake",
                    key: update.key.to_string(),
                })?;
            row.position = update.to;
        }
        Ok(())
    }
}

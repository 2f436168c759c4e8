//! Value types shared by shift plans.

use std::ops::{Bound, RangeBounds};

/// Slot of one row: its scope plus 1-based position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement<S> {
    pub scope: S,
    pub position: i64,
}

/// Active row as seen by a range scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ranked<K> {
    pub key: K,
    pub position: i64,
}

/// One row's position change inside a shift plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionUpdate<K> {
    pub key: K,
    /// Position the row must still hold when the update is applied.
    pub from: i64,
    pub to: i64,
}

impl<K: Copy> PositionUpdate<K> {
    /// Shifts every scanned row by `delta`.
    pub fn shift_all(rows: &[Ranked<K>], delta: i64) -> Vec<Self> {
        rows.iter()
            .map(|row| Self {
                key: row.key,
                from: row.position,
                to: row.position + delta,
            })
            .collect()
    }
}

/// Position predicate for range scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionRange {
    pub lower: Bound<i64>,
    pub upper: Bound<i64>,
}

impl PositionRange {
    pub fn new(lower: Bound<i64>, upper: Bound<i64>) -> Self {
        Self { lower, upper }
    }

    /// Every position.
    pub fn all() -> Self {
        Self::new(Bound::Unbounded, Bound::Unbounded)
    }

    /// `position > start`.
    pub fn after(start: i64) -> Self {
        Self::new(Bound::Excluded(start), Bound::Unbounded)
    }

    /// `position >= start`.
    pub fn starting_at(start: i64) -> Self {
        Self::new(Bound::Included(start), Bound::Unbounded)
    }

    /// Inclusive `(min, max)` pair suitable for `BETWEEN ?min AND ?max`.
    pub fn inclusive_bounds(&self) -> (i64, i64) {
        let min = match self.lower {
            Bound::Included(value) => value,
            Bound::Excluded(value) => value.saturating_add(1),
            Bound::Unbounded => i64::MIN,
        };
        let max = match self.upper {
            Bound::Included(value) => value,
            Bound::Excluded(value) => value.saturating_sub(1),
            Bound::Unbounded => i64::MAX,
        };
        (min, max)
    }
}

impl RangeBounds<i64> for PositionRange {
    fn start_bound(&self) -> Bound<&i64> {
        self.lower.as_ref()
    }

    fn end_bound(&self) -> Bound<&i64> {
        self.upper.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::{PositionRange, PositionUpdate, Ranked};
    use std::ops::{Bound, RangeBounds};

    #[test]
    fn inclusive_bounds_translate_exclusive_edges() {
        let range = PositionRange::new(Bound::Excluded(2), Bound::Included(4));
        assert_eq!(range.inclusive_bounds(), (3, 4));
        assert!(!range.contains(&2));
        assert!(range.contains(&4));

        let range = PositionRange::new(Bound::Included(1), Bound::Excluded(3));
        assert_eq!(range.inclusive_bounds(), (1, 2));

        assert_eq!(PositionRange::all().inclusive_bounds(), (i64::MIN, i64::MAX));
        assert_eq!(PositionRange::starting_at(5).inclusive_bounds(), (5, i64::MAX));
    }

    #[test]
    fn shift_all_keeps_expected_origin() {
        let rows = [Ranked { key: 'a', position: 3 }, Ranked { key: 'b', position: 4 }];
        let updates = PositionUpdate::shift_all(&rows, -1);
        assert_eq!(updates[0].from, 3);
        assert_eq!(updates[0].to, 2);
        assert_eq!(updates[1].key, 'b');
        assert_eq!(updates[1].to, 3);
    }
}

//! Read-only density check for one scope.

use super::{PositionRange, PositionStore};
use crate::repo::StoreResult;
use serde::Serialize;
use std::collections::BTreeMap;

/// Outcome of a density check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DensityReport {
    /// Number of active rows in the scope.
    pub active: usize,
    /// Expected positions `1..=active` that no row holds.
    pub gaps: Vec<i64>,
    /// Positions held by more than one active row.
    pub duplicates: Vec<i64>,
    /// Positions outside `1..=active`.
    pub out_of_range: Vec<i64>,
}

impl DensityReport {
    /// Returns whether active positions are exactly `1..=active`.
    pub fn is_dense(&self) -> bool {
        self.gaps.is_empty() && self.duplicates.is_empty() && self.out_of_range.is_empty()
    }
}

/// Scans every active row of `scope` and reports density violations.
pub fn audit_scope<P: PositionStore>(store: &P, scope: P::Scope) -> StoreResult<DensityReport> {
    let rows = store.range_active(scope, PositionRange::all())?;
    let active = rows.len();

    let mut occurrences: BTreeMap<i64, usize> = BTreeMap::new();
    for row in &rows {
        *occurrences.entry(row.position).or_default() += 1;
    }

    let upper = active as i64;
    let gaps = (1..=upper)
        .filter(|position| !occurrences.contains_key(position))
        .collect();
    let duplicates = occurrences
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(position, _)| *position)
        .collect();
    let out_of_range = occurrences
        .keys()
        .filter(|position| **position < 1 || **position > upper)
        .copied()
        .collect();

    Ok(DensityReport {
        active,
        gaps,
        duplicates,
        out_of_range,
    })
}

#[cfg(test)]
mod tests {
    use super::audit_scope;
    use crate::ordering::fake::VecStore;

    #[test]
    fn dense_scope_reports_clean() {
        let store = VecStore::default().with_scope(1, "abc");
        let report = audit_scope(&store, 1).unwrap();
        assert!(report.is_dense());
        assert_eq!(report.active, 3);
    }

    #[test]
    fn reports_gap_duplicate_and_overflow() {
        let store = VecStore::default().with_scope(1, "abcd");
        store.place('b', 1, 3);
        store.place('d', 1, 7);

        let report = audit_scope(&store, 1).unwrap();
        assert!(!report.is_dense());
        assert_eq!(report.gaps, vec![2, 4]);
        assert_eq!(report.duplicates, vec![3]);
        assert_eq!(report.out_of_range, vec![7]);
    }
}

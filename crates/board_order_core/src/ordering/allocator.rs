//! Append-to-end position allocation.

use super::PositionStore;
use crate::repo::StoreResult;

/// Returns the position a new row takes in `scope`: `active count + 1`.
///
/// Reads a live count; callers must hold the write transaction that also
/// performs the insert, otherwise two concurrent creates can both see the
/// same count.
pub fn allocate<P: PositionStore>(store: &P, scope: P::Scope) -> StoreResult<i64> {
    Ok(store.count_active(scope)? + 1)
}

#[cfg(test)]
mod tests {
    use super::allocate;
    use crate::ordering::fake::VecStore;

    #[test]
    fn appends_after_active_rows_only() {
        let store = VecStore::default().with_scope(1, "ab").with_scope(2, "xyz");
        assert_eq!(allocate(&store, 1).unwrap(), 3);
        assert_eq!(allocate(&store, 3).unwrap(), 1);

        store.deactivate('z');
        assert_eq!(allocate(&store, 2).unwrap(), 3);
    }
}

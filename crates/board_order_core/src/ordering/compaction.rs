//! Gap closing after a row leaves its scope.

use super::{Placement, PositionRange, PositionStore, PositionUpdate};
use crate::repo::StoreResult;

/// Plans the decrement of every active row positioned after `vacated`.
///
/// `vacated` is the pre-delete slot of the removed row. The removed row is
/// expected to be excluded from scans already or to sit exactly at
/// `vacated.position`, so it never appears in the plan.
pub fn plan_compaction<P: PositionStore>(
    store: &P,
    vacated: Placement<P::Scope>,
) -> StoreResult<Vec<PositionUpdate<P::Key>>> {
    let trailing = store.range_active(vacated.scope, PositionRange::after(vacated.position))?;
    Ok(PositionUpdate::shift_all(&trailing, -1))
}

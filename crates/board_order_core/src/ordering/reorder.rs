//! Move planning for same-scope reorders and cross-scope moves.
//!
//! # Invariants
//! - Same scope: the target must lie in `1..=active count`; the rows between
//!   the old and new slot shift by one toward the vacated slot.
//! - Cross scope: the source scope closes its gap, the destination opens a
//!   slot before `requested`. Requests past the end are clamped to
//!   `active count + 1` (insert-before with clamp-to-end).
//! - The moving row itself is never part of `shifts`.

use super::{OrderingError, OrderingResult, Placement, PositionRange, PositionStore, PositionUpdate};
use log::debug;
use std::cmp::Ordering;
use std::ops::Bound;

/// Shift plan plus the moving row's final slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan<S, K> {
    pub from: Placement<S>,
    pub to: Placement<S>,
    pub shifts: Vec<PositionUpdate<K>>,
}

impl<S: PartialEq, K> MovePlan<S, K> {
    /// Returns whether applying the plan would change nothing.
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }

    pub fn crosses_scope(&self) -> bool {
        self.from.scope != self.to.scope
    }
}

/// Computes the plan for moving the row at `from` to `requested` in `dest_scope`.
///
/// # Errors
/// - `InvalidPosition` when `requested < 1`, or when it is past the last
///   active slot of a same-scope move.
pub fn plan_move<P: PositionStore>(
    store: &P,
    from: Placement<P::Scope>,
    dest_scope: P::Scope,
    requested: i64,
) -> OrderingResult<MovePlan<P::Scope, P::Key>> {
    let plan = if dest_scope == from.scope {
        plan_within_scope(store, from, requested)?
    } else {
        plan_across_scopes(store, from, dest_scope, requested)?
    };
    debug!(
        "event=plan_move module=ordering status=ok from={:?} to={:?} shifts={}",
        plan.from,
        plan.to,
        plan.shifts.len()
    );
    Ok(plan)
}

fn plan_within_scope<P: PositionStore>(
    store: &P,
    from: Placement<P::Scope>,
    requested: i64,
) -> OrderingResult<MovePlan<P::Scope, P::Key>> {
    let count = store.count_active(from.scope)?;
    if requested < 1 || requested > count {
        return Err(OrderingError::InvalidPosition {
            requested,
            max: count,
        });
    }

    let shifts = match requested.cmp(&from.position) {
        Ordering::Equal => Vec::new(),
        Ordering::Greater => {
            let range = PositionRange::new(
                Bound::Excluded(from.position),
                Bound::Included(requested),
            );
            PositionUpdate::shift_all(&store.range_active(from.scope, range)?, -1)
        }
        Ordering::Less => {
            let range = PositionRange::new(
                Bound::Included(requested),
                Bound::Excluded(from.position),
            );
            PositionUpdate::shift_all(&store.range_active(from.scope, range)?, 1)
        }
    };

    Ok(MovePlan {
        from,
        to: Placement {
            scope: from.scope,
            position: requested,
        },
        shifts,
    })
}

fn plan_across_scopes<P: PositionStore>(
    store: &P,
    from: Placement<P::Scope>,
    dest_scope: P::Scope,
    requested: i64,
) -> OrderingResult<MovePlan<P::Scope, P::Key>> {
    let append_slot = store.count_active(dest_scope)? + 1;
    if requested < 1 {
        return Err(OrderingError::InvalidPosition {
            requested,
            max: append_slot,
        });
    }
    let target = requested.min(append_slot);

    let trailing_source = store.range_active(from.scope, PositionRange::after(from.position))?;
    let trailing_dest = store.range_active(dest_scope, PositionRange::starting_at(target))?;

    let mut shifts = PositionUpdate::shift_all(&trailing_source, -1);
    shifts.extend(PositionUpdate::shift_all(&trailing_dest, 1));

    Ok(MovePlan {
        from,
        to: Placement {
            scope: dest_scope,
            position: target,
        },
        shifts,
    })
}

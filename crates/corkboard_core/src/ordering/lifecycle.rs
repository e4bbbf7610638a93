//! Per-write entry points used by positioned repositories.
//!
//! Each helper takes the record's explicit before/after placement; nothing
//! is inferred from hidden state on the record.

use super::{
    shift_positions, validate_position, GroupScope, OrderingChecks, OrderingResult,
    PositionStore, PreviousPosition,
};
use uuid::Uuid;

/// A record's group and position at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub scope: GroupScope,
    pub position: i64,
}

impl Placement {
    pub fn new(scope: GroupScope, position: i64) -> Self {
        Self { scope, position }
    }
}

/// What a relocation changed, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relocation {
    /// Same group, same position, or checks skipped.
    Unchanged,
    /// Position changed inside one group.
    WithinGroup { shifted: usize },
    /// Record left one group and entered another.
    AcrossGroups { closed: usize, opened: usize },
}

/// Append-at-end position for a new record in `scope`.
pub fn default_position<S: PositionStore + ?Sized>(
    store: &S,
    scope: &GroupScope,
) -> OrderingResult<i64> {
    store.count_live(scope)
}

/// Resolves where a record currently at `before` should land in `target`.
///
/// An explicit `requested` position wins. Otherwise the record keeps its
/// position inside its own group, or is appended when it changes group.
pub fn target_placement<S: PositionStore + ?Sized>(
    store: &S,
    before: &Placement,
    target: GroupScope,
    requested: Option<i64>,
) -> OrderingResult<Placement> {
    let position = match requested {
        Some(position) => position,
        None if target == before.scope => before.position,
        None => default_position(store, &target)?,
    };
    Ok(Placement::new(target, position))
}

/// Resolves, validates and makes room for a record entering `scope`.
///
/// Returns the position the caller must write. The record must not be
/// stored yet.
pub fn place_new<S: PositionStore + ?Sized>(
    store: &S,
    scope: &GroupScope,
    requested: Option<i64>,
    checks: OrderingChecks,
) -> OrderingResult<i64> {
    let position = match requested {
        Some(position) => position,
        None => default_position(store, scope)?,
    };
    if checks == OrderingChecks::Skip {
        return Ok(position);
    }

    validate_position(store, scope, position, None, true)?;
    shift_positions(store, scope, position, PreviousPosition::New, None)?;
    Ok(position)
}

/// Moves record `id` from `before` to `after`.
///
/// Cross-group moves close the gap in the old group before opening the slot
/// in the new group. Both passes exclude `id`.
pub fn relocate<S: PositionStore + ?Sized>(
    store: &S,
    id: Uuid,
    before: &Placement,
    after: &Placement,
    checks: OrderingChecks,
) -> OrderingResult<Relocation> {
    if checks == OrderingChecks::Skip {
        return Ok(Relocation::Unchanged);
    }

    if before.scope == after.scope {
        validate_position(
            store,
            &after.scope,
            after.position,
            Some(before.position),
            false,
        )?;
        let shifted = shift_positions(
            store,
            &after.scope,
            after.position,
            PreviousPosition::At(before.position),
            Some(id),
        )?;
        if before.position == after.position {
            return Ok(Relocation::Unchanged);
        }
        return Ok(Relocation::WithinGroup { shifted });
    }

    validate_position(
        store,
        &after.scope,
        after.position,
        Some(before.position),
        true,
    )?;
    let closed = shift_positions(
        store,
        &before.scope,
        before.position,
        PreviousPosition::Removed,
        Some(id),
    )?;
    let opened = shift_positions(
        store,
        &after.scope,
        after.position,
        PreviousPosition::New,
        Some(id),
    )?;
    Ok(Relocation::AcrossGroups { closed, opened })
}

/// Closes the gap left by record `id` leaving `placement`.
///
/// Call after the record is soft-deleted or removed.
pub fn release<S: PositionStore + ?Sized>(
    store: &S,
    id: Uuid,
    placement: &Placement,
    checks: OrderingChecks,
) -> OrderingResult<usize> {
    if checks == OrderingChecks::Skip {
        return Ok(0);
    }
    shift_positions(
        store,
        &placement.scope,
        placement.position,
        PreviousPosition::Removed,
        Some(id),
    )
}

//! Dense position maintenance for ordered board collections.
//!
//! # Responsibility
//! - Validate requested positions against the live size of a group.
//! - Shift sibling positions with one bulk range update per pass so every
//!   group stays a dense `0..count` permutation.
//!
//! # Invariants
//! - For every group, live positions are exactly `{0, .., count - 1}` after
//!   any create/move/delete written with [`OrderingChecks::Enforce`].
//! - Validation always completes before the first shift; the old-group pass
//!   of a cross-group move completes before the new-group pass.
//! - The record being placed is excluded from sibling shifts by identity.
//!
//! The maintainer only talks to storage through [`PositionStore`]; callers
//! run it inside the transaction that also writes the record itself.

use crate::db::DbError;
use crate::model::board::BoardId;
use crate::model::list::ListId;
use crate::model::relation::RelationType;
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

mod lifecycle;
mod sqlite;

pub use lifecycle::{
    default_position, place_new, release, relocate, target_placement, Placement, Relocation,
};
pub use sqlite::SqlitePositionStore;

pub type OrderingResult<T> = Result<T, OrderingError>;

/// Errors raised while maintaining positions.
#[derive(Debug)]
pub enum OrderingError {
    /// Requested position is negative or past the allowed maximum.
    InvalidRange {
        entity: &'static str,
        requested: i64,
        /// Exclusive upper bound; `None` when rejected before counting.
        max_exclusive: Option<i64>,
    },
    /// Count query or bulk update failed.
    Db(DbError),
}

impl Display for OrderingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRange {
                entity,
                requested,
                max_exclusive: Some(max),
            } => write!(
                f,
                "invalid {entity} position range: {requested} not in 0..{max}"
            ),
            Self::InvalidRange {
                entity,
                requested,
                max_exclusive: None,
            } => write!(f, "invalid {entity} position range: {requested} is negative"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for OrderingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidRange { .. } => None,
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for OrderingError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for OrderingError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Tables whose rows carry a maintained `position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionedTable {
    Lists,
    Tasks,
    Relations,
    Items,
}

impl PositionedTable {
    pub fn table_name(self) -> &'static str {
        match self {
            Self::Lists => "lists",
            Self::Tasks => "tasks",
            Self::Relations => "relations",
            Self::Items => "items",
        }
    }

    /// Singular entity label used in errors and log events.
    pub fn entity(self) -> &'static str {
        match self {
            Self::Lists => "list",
            Self::Tasks => "task",
            Self::Relations => "relation",
            Self::Items => "item",
        }
    }
}

/// Identifies one ordering group: a table plus equality filters on its
/// group-key columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupScope {
    table: PositionedTable,
    keys: Vec<(&'static str, String)>,
}

impl GroupScope {
    /// Lists of one board.
    pub fn lists_of(board_uuid: BoardId) -> Self {
        Self {
            table: PositionedTable::Lists,
            keys: vec![("board_uuid", board_uuid.to_string())],
        }
    }

    /// Tasks of one list.
    pub fn tasks_of(list_uuid: ListId) -> Self {
        Self {
            table: PositionedTable::Tasks,
            keys: vec![("list_uuid", list_uuid.to_string())],
        }
    }

    /// Items of one list.
    pub fn items_of(list_uuid: ListId) -> Self {
        Self {
            table: PositionedTable::Items,
            keys: vec![("list_uuid", list_uuid.to_string())],
        }
    }

    /// Relations of one board with the given orientation.
    pub fn relations_of(board_uuid: BoardId, relation_type: RelationType) -> Self {
        Self {
            table: PositionedTable::Relations,
            keys: vec![
                ("board_uuid", board_uuid.to_string()),
                ("relation_type", relation_type.as_str().to_string()),
            ],
        }
    }

    pub fn table(&self) -> PositionedTable {
        self.table
    }

    /// Group-key `(column, value)` equality filters.
    pub fn keys(&self) -> &[(&'static str, String)] {
        &self.keys
    }
}

impl Display for GroupScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.table.table_name())?;
        for (column, value) in &self.keys {
            write!(f, " {column}={value}")?;
        }
        Ok(())
    }
}

/// Where the record was before the write being maintained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviousPosition {
    /// Record is entering the group: make room at the new position.
    New,
    /// Record is leaving the group: the new position is the vacated slot.
    Removed,
    /// Record already occupied this position in the same group.
    At(i64),
}

/// Whether a positioned write runs validation and sibling shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderingChecks {
    #[default]
    Enforce,
    /// Trusted bulk writes with pre-computed positions. No range or density
    /// guarantee is enforced for the group.
    Skip,
}

/// One bulk conditional update: add `delta` to every live sibling in
/// `scope` with `from <= position [<= to]`, except `exclude`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionShift<'a> {
    pub scope: &'a GroupScope,
    pub from: i64,
    pub to: Option<i64>,
    pub delta: i64,
    pub exclude: Option<Uuid>,
}

/// Storage collaborators consumed by the maintainer.
pub trait PositionStore {
    /// Counts live records in the group.
    fn count_live(&self, scope: &GroupScope) -> OrderingResult<i64>;
    /// Applies one bulk shift and returns the number of rows changed.
    fn shift(&self, shift: &PositionShift<'_>) -> OrderingResult<usize>;
}

/// Checks that `requested` is a legal position in the target group.
///
/// `live_count` is taken from the store as it is now: a record moving
/// inside its own group is still counted, a record entering the group is
/// not yet counted. Entering records may land one past the last index.
///
/// # Errors
/// - `InvalidRange` when `requested < 0` or `requested >= max`.
/// - `Db` when the count query fails.
pub fn validate_position<S: PositionStore + ?Sized>(
    store: &S,
    scope: &GroupScope,
    requested: i64,
    previous: Option<i64>,
    inserting: bool,
) -> OrderingResult<()> {
    if !inserting && previous == Some(requested) {
        return Ok(());
    }

    let entity = scope.table().entity();
    if requested < 0 {
        return Err(OrderingError::InvalidRange {
            entity,
            requested,
            max_exclusive: None,
        });
    }

    let count = store.count_live(scope)?;
    let max_exclusive = if inserting { count + 1 } else { count };
    if requested >= max_exclusive {
        return Err(OrderingError::InvalidRange {
            entity,
            requested,
            max_exclusive: Some(max_exclusive),
        });
    }
    Ok(())
}

/// Range and delta of the single shift pass needed for one change.
///
/// Returns `None` for an unchanged in-group position.
pub fn plan_shift(
    new_position: i64,
    previous: PreviousPosition,
) -> Option<(i64, Option<i64>, i64)> {
    match previous {
        PreviousPosition::New => Some((new_position, None, 1)),
        PreviousPosition::Removed => Some((new_position, None, -1)),
        PreviousPosition::At(old) if old == new_position => None,
        PreviousPosition::At(old) if new_position > old => Some((old, Some(new_position), -1)),
        PreviousPosition::At(old) => Some((new_position, Some(old), 1)),
    }
}

/// Shifts the siblings of one group around `new_position`.
///
/// Returns the number of sibling rows changed (zero for a no-op).
pub fn shift_positions<S: PositionStore + ?Sized>(
    store: &S,
    scope: &GroupScope,
    new_position: i64,
    previous: PreviousPosition,
    exclude: Option<Uuid>,
) -> OrderingResult<usize> {
    let Some((from, to, delta)) = plan_shift(new_position, previous) else {
        return Ok(0);
    };

    let rows = store.shift(&PositionShift {
        scope,
        from,
        to,
        delta,
        exclude,
    })?;
    debug!(
        "event=position_shift module=ordering table={} from={} to={} delta={} rows={}",
        scope.table().table_name(),
        from,
        to.map_or_else(|| "end".to_string(), |value| value.to_string()),
        delta,
        rows
    );
    Ok(rows)
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingStore;
    use super::{
        plan_shift, shift_positions, validate_position, GroupScope, OrderingError,
        PreviousPosition,
    };
    use uuid::Uuid;

    fn scope() -> GroupScope {
        GroupScope::items_of(Uuid::new_v4())
    }

    #[test]
    fn unchanged_position_skips_count_query() {
        let store = RecordingStore::with_count(5);
        validate_position(&store, &scope(), 2, Some(2), false).unwrap();
        assert_eq!(store.count_calls.get(), 0);
    }

    #[test]
    fn insert_accepts_append_slot_and_rejects_beyond() {
        let store = RecordingStore::with_count(5);
        let scope = scope();

        validate_position(&store, &scope, 5, None, true).unwrap();
        let err = validate_position(&store, &scope, 6, None, true).unwrap_err();
        assert!(matches!(
            err,
            OrderingError::InvalidRange {
                requested: 6,
                max_exclusive: Some(6),
                ..
            }
        ));
    }

    #[test]
    fn negative_position_is_rejected_without_counting() {
        let store = RecordingStore::with_count(5);
        let err = validate_position(&store, &scope(), -1, None, true).unwrap_err();
        assert!(matches!(
            err,
            OrderingError::InvalidRange {
                requested: -1,
                max_exclusive: None,
                ..
            }
        ));
        assert_eq!(store.count_calls.get(), 0);
    }

    #[test]
    fn in_group_move_cannot_reach_count() {
        let store = RecordingStore::with_count(5);
        let scope = scope();

        validate_position(&store, &scope, 4, Some(1), false).unwrap();
        assert!(validate_position(&store, &scope, 5, Some(1), false).is_err());
    }

    #[test]
    fn cross_group_arrival_may_append() {
        let store = RecordingStore::with_count(3);
        // Same numeric position as before still counts as an insertion.
        validate_position(&store, &scope(), 3, Some(3), true).unwrap();
        assert_eq!(store.count_calls.get(), 1);
    }

    #[test]
    fn plan_covers_all_modes() {
        assert_eq!(plan_shift(2, PreviousPosition::New), Some((2, None, 1)));
        assert_eq!(plan_shift(2, PreviousPosition::Removed), Some((2, None, -1)));
        assert_eq!(plan_shift(3, PreviousPosition::At(1)), Some((1, Some(3), -1)));
        assert_eq!(plan_shift(1, PreviousPosition::At(3)), Some((1, Some(3), 1)));
        assert_eq!(plan_shift(2, PreviousPosition::At(2)), None);
    }

    #[test]
    fn zero_positions_are_not_treated_as_absent() {
        assert_eq!(plan_shift(0, PreviousPosition::At(0)), None);
        assert_eq!(plan_shift(2, PreviousPosition::At(0)), Some((0, Some(2), -1)));
    }

    #[test]
    fn no_op_shift_writes_nothing() {
        let store = RecordingStore::with_count(5);
        let rows = shift_positions(&store, &scope(), 3, PreviousPosition::At(3), None).unwrap();
        assert_eq!(rows, 0);
        assert!(store.shifts.borrow().is_empty());
    }
}

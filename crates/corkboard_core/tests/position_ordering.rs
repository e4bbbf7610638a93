use corkboard_core::db::open_db_in_memory;
use corkboard_core::ordering::{
    relocate, GroupScope, OrderingResult, Placement, PositionShift, PositionStore, Relocation,
    SqlitePositionStore,
};
use corkboard_core::repo::board_repo::{BoardRepository, SqliteBoardRepository};
use corkboard_core::repo::item_repo::{ItemRepository, SqliteItemRepository};
use corkboard_core::repo::list_repo::{ListRepository, SqliteListRepository};
use corkboard_core::repo::relation_repo::{RelationRepository, SqliteRelationRepository};
use corkboard_core::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use corkboard_core::repo::user_repo::{SqliteUserRepository, UserRepository};
use corkboard_core::{
    Board, BoardId, Item, List, ListId, NewItem, NewList, NewRelation, NewTask, OrderingChecks,
    OrderingError, RelationType, RepoError, User,
};
use rusqlite::Connection;
use std::cell::Cell;

const ENFORCE: OrderingChecks = OrderingChecks::Enforce;

fn seed_board(conn: &Connection) -> BoardId {
    let users = SqliteUserRepository::try_new(conn).unwrap();
    let user = users
        .create_user(&User::new(format!("{}@example.com", uuid::Uuid::new_v4()), None))
        .unwrap();
    let boards = SqliteBoardRepository::try_new(conn).unwrap();
    boards.create_board(&Board::new(user.uuid, "Board")).unwrap().uuid
}

fn seed_list(conn: &Connection, board: BoardId, name: &str) -> List {
    let lists = SqliteListRepository::try_new(conn).unwrap();
    lists.create_list(&NewList::new(board, name), ENFORCE).unwrap()
}

/// Creates `count` items named `{prefix}0..` appended in order.
fn seed_items(conn: &Connection, list: ListId, prefix: &str, count: usize) -> Vec<Item> {
    let items = SqliteItemRepository::try_new(conn).unwrap();
    (0..count)
        .map(|index| {
            items
                .create_item(&NewItem::new(list, format!("{prefix}{index}")), ENFORCE)
                .unwrap()
        })
        .collect()
}

/// Item names in position order; asserts the positions are exactly `0..n`.
fn item_names(conn: &Connection, list: ListId) -> Vec<String> {
    let items = SqliteItemRepository::try_new(conn)
        .unwrap()
        .list_items_of_list(list)
        .unwrap();
    let positions: Vec<i64> = items.iter().map(|item| item.position).collect();
    assert_eq!(positions, (0..items.len() as i64).collect::<Vec<_>>());
    items.into_iter().map(|item| item.name).collect()
}

fn assert_invalid_range(err: RepoError, requested: i64) {
    match err {
        RepoError::Ordering(OrderingError::InvalidRange {
            requested: actual, ..
        }) => assert_eq!(actual, requested),
        other => panic!("expected invalid range, got {other}"),
    }
}

#[test]
fn create_without_position_appends() {
    let conn = open_db_in_memory().unwrap();
    let board = seed_board(&conn);
    let lists = SqliteListRepository::try_new(&conn).unwrap();

    for name in ["Todo", "Doing", "Done"] {
        lists.create_list(&NewList::new(board, name), ENFORCE).unwrap();
    }

    let stored = lists.list_lists_of_board(board).unwrap();
    let summary: Vec<(&str, i64)> = stored
        .iter()
        .map(|list| (list.name.as_str(), list.position))
        .collect();
    assert_eq!(summary, vec![("Todo", 0), ("Doing", 1), ("Done", 2)]);
}

#[test]
fn insert_at_front_makes_room() {
    let conn = open_db_in_memory().unwrap();
    let board = seed_board(&conn);
    let list = seed_list(&conn, board, "Todo");
    seed_items(&conn, list.uuid, "i", 3);

    let items = SqliteItemRepository::try_new(&conn).unwrap();
    items
        .create_item(&NewItem::new(list.uuid, "first").at(0), ENFORCE)
        .unwrap();

    assert_eq!(item_names(&conn, list.uuid), vec!["first", "i0", "i1", "i2"]);
}

#[test]
fn range_rejection_for_group_of_five() {
    let conn = open_db_in_memory().unwrap();
    let board = seed_board(&conn);
    let list = seed_list(&conn, board, "Todo");
    seed_items(&conn, list.uuid, "i", 5);
    let items = SqliteItemRepository::try_new(&conn).unwrap();

    let err = items
        .create_item(&NewItem::new(list.uuid, "six").at(6), ENFORCE)
        .unwrap_err();
    assert_invalid_range(err, 6);
    let err = items
        .create_item(&NewItem::new(list.uuid, "negative").at(-1), ENFORCE)
        .unwrap_err();
    assert!(err.is_invalid_range());
    assert_eq!(item_names(&conn, list.uuid).len(), 5);

    items
        .create_item(&NewItem::new(list.uuid, "appended").at(5), ENFORCE)
        .unwrap();
    assert_eq!(item_names(&conn, list.uuid)[5], "appended");
}

#[test]
fn forward_move_pulls_siblings_back() {
    let conn = open_db_in_memory().unwrap();
    let board = seed_board(&conn);
    let list = seed_list(&conn, board, "Todo");
    let seeded = seed_items(&conn, list.uuid, "i", 5);
    let items = SqliteItemRepository::try_new(&conn).unwrap();

    let mut moved = seeded[1].clone();
    moved.position = 3;
    let stored = items.update_item(&moved, ENFORCE).unwrap();

    assert_eq!(stored.position, 3);
    assert_eq!(item_names(&conn, list.uuid), vec!["i0", "i2", "i3", "i1", "i4"]);
}

#[test]
fn backward_move_pushes_siblings_forward() {
    let conn = open_db_in_memory().unwrap();
    let board = seed_board(&conn);
    let list = seed_list(&conn, board, "Todo");
    let seeded = seed_items(&conn, list.uuid, "i", 5);
    let items = SqliteItemRepository::try_new(&conn).unwrap();

    let mut moved = seeded[3].clone();
    moved.position = 1;
    items.update_item(&moved, ENFORCE).unwrap();

    assert_eq!(item_names(&conn, list.uuid), vec!["i0", "i3", "i1", "i2", "i4"]);
}

#[test]
fn in_group_move_cannot_target_count() {
    let conn = open_db_in_memory().unwrap();
    let board = seed_board(&conn);
    let list = seed_list(&conn, board, "Todo");
    let seeded = seed_items(&conn, list.uuid, "i", 5);
    let items = SqliteItemRepository::try_new(&conn).unwrap();

    let mut moved = seeded[0].clone();
    moved.position = 5;
    let err = items.update_item(&moved, ENFORCE).unwrap_err();
    assert_invalid_range(err, 5);

    moved.position = 4;
    items.update_item(&moved, ENFORCE).unwrap();
    assert_eq!(item_names(&conn, list.uuid), vec!["i1", "i2", "i3", "i4", "i0"]);
}

#[test]
fn delete_closes_gap() {
    let conn = open_db_in_memory().unwrap();
    let board = seed_board(&conn);
    let list = seed_list(&conn, board, "Todo");
    let seeded = seed_items(&conn, list.uuid, "i", 5);
    let items = SqliteItemRepository::try_new(&conn).unwrap();

    items.delete_item(seeded[2].uuid).unwrap();

    assert_eq!(item_names(&conn, list.uuid), vec!["i0", "i1", "i3", "i4"]);
    assert!(items.get_item(seeded[2].uuid).unwrap().is_none());
}

#[test]
fn cross_group_move_closes_and_opens() {
    let conn = open_db_in_memory().unwrap();
    let board = seed_board(&conn);
    let list_a = seed_list(&conn, board, "A");
    let list_b = seed_list(&conn, board, "B");
    let in_a = seed_items(&conn, list_a.uuid, "a", 5);
    seed_items(&conn, list_b.uuid, "b", 3);
    let items = SqliteItemRepository::try_new(&conn).unwrap();

    let moved = items
        .move_item(in_a[2].uuid, list_b.uuid, Some(1), ENFORCE)
        .unwrap();

    assert_eq!(moved.list_uuid, list_b.uuid);
    assert_eq!(moved.position, 1);
    assert_eq!(item_names(&conn, list_a.uuid), vec!["a0", "a1", "a3", "a4"]);
    assert_eq!(item_names(&conn, list_b.uuid), vec!["b0", "a2", "b1", "b2"]);
}

#[test]
fn cross_group_move_without_position_appends() {
    let conn = open_db_in_memory().unwrap();
    let board = seed_board(&conn);
    let list_a = seed_list(&conn, board, "A");
    let list_b = seed_list(&conn, board, "B");
    let in_a = seed_items(&conn, list_a.uuid, "a", 2);
    seed_items(&conn, list_b.uuid, "b", 2);
    let items = SqliteItemRepository::try_new(&conn).unwrap();

    let moved = items.move_item(in_a[0].uuid, list_b.uuid, None, ENFORCE).unwrap();

    assert_eq!(moved.position, 2);
    assert_eq!(item_names(&conn, list_a.uuid), vec!["a1"]);
    assert_eq!(item_names(&conn, list_b.uuid), vec!["b0", "b1", "a0"]);
}

#[test]
fn rejected_cross_group_move_changes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let board = seed_board(&conn);
    let list_a = seed_list(&conn, board, "A");
    let list_b = seed_list(&conn, board, "B");
    let in_a = seed_items(&conn, list_a.uuid, "a", 3);
    seed_items(&conn, list_b.uuid, "b", 3);
    let items = SqliteItemRepository::try_new(&conn).unwrap();

    let err = items
        .move_item(in_a[0].uuid, list_b.uuid, Some(4), ENFORCE)
        .unwrap_err();
    assert_invalid_range(err, 4);
    assert_eq!(item_names(&conn, list_a.uuid), vec!["a0", "a1", "a2"]);
    assert_eq!(item_names(&conn, list_b.uuid), vec!["b0", "b1", "b2"]);

    // Landing one past the last index of the target list is allowed.
    items
        .move_item(in_a[0].uuid, list_b.uuid, Some(3), ENFORCE)
        .unwrap();
    assert_eq!(item_names(&conn, list_b.uuid), vec!["b0", "b1", "b2", "a0"]);
}

#[test]
fn moving_to_list_of_another_board_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let board = seed_board(&conn);
    let other_board = seed_board(&conn);
    let list = seed_list(&conn, board, "A");
    let foreign = seed_list(&conn, other_board, "Foreign");
    let seeded = seed_items(&conn, list.uuid, "a", 2);
    let items = SqliteItemRepository::try_new(&conn).unwrap();

    let err = items
        .move_item(seeded[0].uuid, foreign.uuid, Some(0), ENFORCE)
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));
    assert_eq!(item_names(&conn, list.uuid), vec!["a0", "a1"]);
}

#[test]
fn position_zero_is_an_explicit_request() {
    let conn = open_db_in_memory().unwrap();
    let board = seed_board(&conn);
    let list_a = seed_list(&conn, board, "A");
    let list_b = seed_list(&conn, board, "B");
    let in_a = seed_items(&conn, list_a.uuid, "a", 1);
    seed_items(&conn, list_b.uuid, "b", 2);
    let items = SqliteItemRepository::try_new(&conn).unwrap();

    let moved = items
        .move_item(in_a[0].uuid, list_b.uuid, Some(0), ENFORCE)
        .unwrap();

    assert_eq!(moved.position, 0);
    assert_eq!(item_names(&conn, list_b.uuid), vec!["a0", "b0", "b1"]);
}

/// Wraps the SQLite store and counts collaborator calls.
struct CountingStore<'conn> {
    inner: SqlitePositionStore<'conn>,
    counts: Cell<usize>,
    shifts: Cell<usize>,
}

impl PositionStore for CountingStore<'_> {
    fn count_live(&self, scope: &GroupScope) -> OrderingResult<i64> {
        self.counts.set(self.counts.get() + 1);
        self.inner.count_live(scope)
    }

    fn shift(&self, shift: &PositionShift<'_>) -> OrderingResult<usize> {
        self.shifts.set(self.shifts.get() + 1);
        self.inner.shift(shift)
    }
}

#[test]
fn unchanged_position_skips_count_and_shift() {
    let conn = open_db_in_memory().unwrap();
    let board = seed_board(&conn);
    let list = seed_list(&conn, board, "Todo");
    let seeded = seed_items(&conn, list.uuid, "i", 3);

    let store = CountingStore {
        inner: SqlitePositionStore::new(&conn),
        counts: Cell::new(0),
        shifts: Cell::new(0),
    };
    let placement = Placement::new(GroupScope::items_of(list.uuid), 1);
    let outcome = relocate(&store, seeded[1].uuid, &placement, &placement, ENFORCE).unwrap();

    assert_eq!(outcome, Relocation::Unchanged);
    assert_eq!(store.counts.get(), 0);
    assert_eq!(store.shifts.get(), 0);

    // Renaming through the repository keeps every position.
    let items = SqliteItemRepository::try_new(&conn).unwrap();
    let mut renamed = seeded[1].clone();
    renamed.name = "renamed".to_string();
    items.update_item(&renamed, ENFORCE).unwrap();
    assert_eq!(item_names(&conn, list.uuid), vec!["i0", "renamed", "i2"]);
}

#[test]
fn skipped_checks_write_positions_verbatim() {
    let conn = open_db_in_memory().unwrap();
    let board = seed_board(&conn);
    let list = seed_list(&conn, board, "Todo");
    seed_items(&conn, list.uuid, "i", 2);
    let items = SqliteItemRepository::try_new(&conn).unwrap();

    let created = items
        .create_item(&NewItem::new(list.uuid, "trusted").at(7), OrderingChecks::Skip)
        .unwrap();

    assert_eq!(created.position, 7);
    let positions: Vec<i64> = items
        .list_items_of_list(list.uuid)
        .unwrap()
        .iter()
        .map(|item| item.position)
        .collect();
    assert_eq!(positions, vec![0, 1, 7]);
}

#[test]
fn relation_types_are_ordered_independently() {
    let conn = open_db_in_memory().unwrap();
    let board = seed_board(&conn);
    let relations = SqliteRelationRepository::try_new(&conn).unwrap();

    let v0 = relations
        .create_relation(&NewRelation::new(board, "v0", RelationType::Vertical), ENFORCE)
        .unwrap();
    let v1 = relations
        .create_relation(&NewRelation::new(board, "v1", RelationType::Vertical), ENFORCE)
        .unwrap();
    let h0 = relations
        .create_relation(&NewRelation::new(board, "h0", RelationType::Horizontal), ENFORCE)
        .unwrap();
    assert_eq!((v0.position, v1.position, h0.position), (0, 1, 0));

    // Type change is a cross-group move; no position appends.
    let mut switched = v0.clone();
    switched.relation_type = RelationType::Horizontal;
    let switched = relations.save_relation(&switched, None, ENFORCE).unwrap();
    assert_eq!(switched.position, 1);

    let stored: Vec<(String, RelationType, i64)> = relations
        .list_relations_of_board(board)
        .unwrap()
        .into_iter()
        .map(|relation| (relation.name, relation.relation_type, relation.position))
        .collect();
    assert_eq!(
        stored,
        vec![
            ("v1".to_string(), RelationType::Vertical, 0),
            ("h0".to_string(), RelationType::Horizontal, 0),
            ("v0".to_string(), RelationType::Horizontal, 1),
        ]
    );
}

#[test]
fn deleting_list_closes_gap_and_hides_children() {
    let conn = open_db_in_memory().unwrap();
    let board = seed_board(&conn);
    let lists = SqliteListRepository::try_new(&conn).unwrap();
    let first = seed_list(&conn, board, "first");
    let doomed = seed_list(&conn, board, "doomed");
    let last = seed_list(&conn, board, "last");
    seed_items(&conn, doomed.uuid, "d", 2);
    let tasks = SqliteTaskRepository::try_new(&conn).unwrap();
    tasks
        .create_task(&NewTask::new(doomed.uuid, "task"), ENFORCE)
        .unwrap();

    lists.delete_list(doomed.uuid).unwrap();

    let remaining: Vec<(uuid::Uuid, i64)> = lists
        .list_lists_of_board(board)
        .unwrap()
        .into_iter()
        .map(|list| (list.uuid, list.position))
        .collect();
    assert_eq!(remaining, vec![(first.uuid, 0), (last.uuid, 1)]);
    let items = SqliteItemRepository::try_new(&conn).unwrap();
    assert!(items.list_items_of_board(board).unwrap().is_empty());
    assert!(tasks.list_tasks_of_board(board).unwrap().is_empty());
}

/// Deterministic pseudo-random sequence of task creates, moves and deletes
/// across two lists; both lists must stay dense after every step.
#[test]
fn density_holds_under_mixed_operations() {
    let conn = open_db_in_memory().unwrap();
    let board = seed_board(&conn);
    let lists = [seed_list(&conn, board, "A").uuid, seed_list(&conn, board, "B").uuid];
    let tasks = SqliteTaskRepository::try_new(&conn).unwrap();

    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = |bound: u64| {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (state >> 33) % bound
    };

    for step in 0..200 {
        let list = lists[next(2) as usize];
        let live = tasks.list_tasks_of_list(list).unwrap();
        match next(4) {
            0 | 1 => {
                let position = next(live.len() as u64 + 1) as i64;
                tasks
                    .create_task(&NewTask::new(list, format!("t{step}")).at(position), ENFORCE)
                    .unwrap();
            }
            2 if !live.is_empty() => {
                let task = &live[next(live.len() as u64) as usize];
                let target = lists[next(2) as usize];
                let target_len = tasks.list_tasks_of_list(target).unwrap().len() as u64;
                let bound = if target == list { target_len } else { target_len + 1 };
                let position = next(bound) as i64;
                tasks
                    .move_task(task.uuid, target, Some(position), ENFORCE)
                    .unwrap();
            }
            3 if !live.is_empty() => {
                let task = &live[next(live.len() as u64) as usize];
                tasks.delete_task(task.uuid).unwrap();
            }
            _ => {}
        }

        for list in lists {
            let positions: Vec<i64> = tasks
                .list_tasks_of_list(list)
                .unwrap()
                .iter()
                .map(|task| task.position)
                .collect();
            assert_eq!(
                positions,
                (0..positions.len() as i64).collect::<Vec<_>>(),
                "list not dense after step {step}"
            );
        }
    }
}

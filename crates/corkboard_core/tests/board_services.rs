use corkboard_core::db::open_db_in_memory;
use corkboard_core::repo::user_repo::{SqliteUserRepository, UserRepository};
use corkboard_core::{
    BoardService, CardService, ItemPatch, ListPatch, RelationPatch, RelationType, ServiceError,
    TaskPatch, TeamService, User, UserId,
};
use rusqlite::Connection;

fn create_user(conn: &Connection, handle: &str) -> UserId {
    let users = SqliteUserRepository::try_new(conn).unwrap();
    users
        .create_user(&User::new(
            format!("{handle}@example.com"),
            Some(handle.to_string()),
        ))
        .unwrap()
        .uuid
}

#[test]
fn owner_and_team_members_can_use_board_others_cannot() {
    let conn = open_db_in_memory().unwrap();
    let owner = create_user(&conn, "owner");
    let teammate = create_user(&conn, "mate");
    let stranger = create_user(&conn, "stranger");

    let teams = TeamService::try_new(&conn).unwrap();
    let team = teams.create_team(owner, "Crew").unwrap();
    teams.add_member(owner, team.uuid, "mate").unwrap();

    let boards = BoardService::try_new(&conn).unwrap();
    let board = boards.create_board(owner, "Roadmap", Some(team.uuid)).unwrap();

    assert!(boards.board_view(owner, board.uuid).is_ok());
    assert!(boards.board_view(teammate, board.uuid).is_ok());
    let err = boards.board_view(stranger, board.uuid).unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized { entity: "board", .. }));

    let visible: Vec<_> = boards
        .list_boards(teammate)
        .unwrap()
        .into_iter()
        .map(|board| board.uuid)
        .collect();
    assert_eq!(visible, vec![board.uuid]);
    assert!(boards.list_boards(stranger).unwrap().is_empty());
}

#[test]
fn only_owner_may_share_or_delete() {
    let conn = open_db_in_memory().unwrap();
    let owner = create_user(&conn, "owner");
    let teammate = create_user(&conn, "mate");

    let teams = TeamService::try_new(&conn).unwrap();
    let team = teams.create_team(owner, "Crew").unwrap();
    teams.add_member(owner, team.uuid, "mate@example.com").unwrap();

    let boards = BoardService::try_new(&conn).unwrap();
    let board = boards.create_board(owner, "Roadmap", Some(team.uuid)).unwrap();

    let renamed = boards.rename_board(teammate, board.uuid, "  Plan  ").unwrap();
    assert_eq!(renamed.name, "Plan");
    assert!(matches!(
        boards.share_board(teammate, board.uuid, None).unwrap_err(),
        ServiceError::Unauthorized { .. }
    ));
    assert!(matches!(
        boards.delete_board(teammate, board.uuid).unwrap_err(),
        ServiceError::Unauthorized { .. }
    ));

    boards.delete_board(owner, board.uuid).unwrap();
    assert!(matches!(
        boards.board_view(owner, board.uuid).unwrap_err(),
        ServiceError::NotFound { entity: "board", .. }
    ));
}

#[test]
fn sharing_with_foreign_team_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let owner = create_user(&conn, "owner");
    let other = create_user(&conn, "other");

    let teams = TeamService::try_new(&conn).unwrap();
    let foreign = teams.create_team(other, "Elsewhere").unwrap();

    let boards = BoardService::try_new(&conn).unwrap();
    let err = boards
        .create_board(owner, "Roadmap", Some(foreign.uuid))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized { entity: "team", .. }));
}

#[test]
fn board_view_nests_cards_under_lists_in_order() {
    let conn = open_db_in_memory().unwrap();
    let owner = create_user(&conn, "owner");
    let boards = BoardService::try_new(&conn).unwrap();
    let cards = CardService::try_new(&conn).unwrap();

    let board = boards.create_board(owner, "Roadmap", None).unwrap();
    let todo = boards.create_list(owner, board.uuid, "Todo", None).unwrap();
    let done = boards.create_list(owner, board.uuid, "Done", None).unwrap();
    cards.create_item(owner, todo.uuid, "second", None, None).unwrap();
    cards
        .create_item(owner, todo.uuid, "first", Some("details"), Some(0))
        .unwrap();
    cards.create_task(owner, done.uuid, "ship", None).unwrap();
    boards
        .create_relation(owner, board.uuid, "Week 1", RelationType::Vertical, None)
        .unwrap();

    let view = boards.board_view(owner, board.uuid).unwrap();
    let lists: Vec<&str> = view.lists.iter().map(|list| list.list.name.as_str()).collect();
    assert_eq!(lists, vec!["Todo", "Done"]);
    let todo_items: Vec<&str> = view.lists[0]
        .items
        .iter()
        .map(|item| item.name.as_str())
        .collect();
    assert_eq!(todo_items, vec!["first", "second"]);
    assert_eq!(view.lists[0].items[0].description.as_deref(), Some("details"));
    assert_eq!(view.lists[1].tasks.len(), 1);
    assert_eq!(view.relations.len(), 1);

    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["name"], "Roadmap");
    assert_eq!(json["relations"][0]["type"], "vertical");
    assert_eq!(json["lists"][0]["items"][1]["position"], 1);
}

#[test]
fn list_and_relation_patches_reorder() {
    let conn = open_db_in_memory().unwrap();
    let owner = create_user(&conn, "owner");
    let boards = BoardService::try_new(&conn).unwrap();
    let board = boards.create_board(owner, "Roadmap", None).unwrap();
    let a = boards.create_list(owner, board.uuid, "A", None).unwrap();
    boards.create_list(owner, board.uuid, "B", None).unwrap();
    boards.create_list(owner, board.uuid, "C", None).unwrap();

    boards
        .update_list(
            owner,
            a.uuid,
            ListPatch {
                name: Some("A'".to_string()),
                position: Some(2),
            },
        )
        .unwrap();
    let names: Vec<String> = boards
        .lists(owner, board.uuid)
        .unwrap()
        .into_iter()
        .map(|list| list.name)
        .collect();
    assert_eq!(names, vec!["B", "C", "A'"]);

    let err = boards
        .update_list(
            owner,
            a.uuid,
            ListPatch {
                position: Some(3),
                ..ListPatch::default()
            },
        )
        .unwrap_err();
    assert!(err.is_invalid_range());

    let row = boards
        .create_relation(owner, board.uuid, "Row", RelationType::Horizontal, None)
        .unwrap();
    let moved = boards
        .update_relation(
            owner,
            row.uuid,
            RelationPatch {
                relation_type: Some(RelationType::Vertical),
                ..RelationPatch::default()
            },
        )
        .unwrap();
    assert_eq!(moved.relation_type, RelationType::Vertical);
    assert_eq!(moved.position, 0);
}

#[test]
fn card_moves_between_lists_of_same_board() {
    let conn = open_db_in_memory().unwrap();
    let owner = create_user(&conn, "owner");
    let boards = BoardService::try_new(&conn).unwrap();
    let cards = CardService::try_new(&conn).unwrap();
    let board = boards.create_board(owner, "Roadmap", None).unwrap();
    let todo = boards.create_list(owner, board.uuid, "Todo", None).unwrap();
    let done = boards.create_list(owner, board.uuid, "Done", None).unwrap();

    let item = cards.create_item(owner, todo.uuid, "card", None, None).unwrap();
    cards.create_item(owner, done.uuid, "old", None, None).unwrap();

    let moved = cards.move_item(owner, item.uuid, done.uuid, Some(0)).unwrap();
    assert_eq!((moved.list_uuid, moved.position), (done.uuid, 0));
    assert!(cards.items(owner, todo.uuid).unwrap().is_empty());

    let patched = cards
        .update_item(
            owner,
            item.uuid,
            ItemPatch {
                description: Some(Some("notes".to_string())),
                list_uuid: Some(todo.uuid),
                ..ItemPatch::default()
            },
        )
        .unwrap();
    assert_eq!((patched.list_uuid, patched.position), (todo.uuid, 0));
    assert_eq!(patched.description.as_deref(), Some("notes"));
    assert_eq!(cards.items(owner, done.uuid).unwrap()[0].position, 0);

    let task = cards.create_task(owner, todo.uuid, "task", None).unwrap();
    let task = cards
        .update_task(
            owner,
            task.uuid,
            TaskPatch {
                list_uuid: Some(done.uuid),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    assert_eq!(task.list_uuid, done.uuid);
    cards.delete_task(owner, task.uuid).unwrap();
    assert!(cards.tasks(owner, done.uuid).unwrap().is_empty());
}

#[test]
fn cards_cannot_cross_boards() {
    let conn = open_db_in_memory().unwrap();
    let owner = create_user(&conn, "owner");
    let boards = BoardService::try_new(&conn).unwrap();
    let cards = CardService::try_new(&conn).unwrap();
    let first = boards.create_board(owner, "First", None).unwrap();
    let second = boards.create_board(owner, "Second", None).unwrap();
    let here = boards.create_list(owner, first.uuid, "Here", None).unwrap();
    let there = boards.create_list(owner, second.uuid, "There", None).unwrap();

    let item = cards.create_item(owner, here.uuid, "card", None, None).unwrap();
    let err = cards.move_item(owner, item.uuid, there.uuid, None).unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[test]
fn strangers_cannot_touch_cards() {
    let conn = open_db_in_memory().unwrap();
    let owner = create_user(&conn, "owner");
    let stranger = create_user(&conn, "stranger");
    let boards = BoardService::try_new(&conn).unwrap();
    let cards = CardService::try_new(&conn).unwrap();
    let board = boards.create_board(owner, "Roadmap", None).unwrap();
    let list = boards.create_list(owner, board.uuid, "Todo", None).unwrap();
    let item = cards.create_item(owner, list.uuid, "card", None, None).unwrap();

    assert!(matches!(
        cards.get_item(stranger, item.uuid).unwrap_err(),
        ServiceError::Unauthorized { .. }
    ));
    assert!(matches!(
        cards.create_task(stranger, list.uuid, "sneaky", None).unwrap_err(),
        ServiceError::Unauthorized { .. }
    ));
    assert!(matches!(
        boards.create_list(owner, board.uuid, "   ", None).unwrap_err(),
        ServiceError::InvalidInput(_)
    ));
}

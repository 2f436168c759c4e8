use board_order_core::db::open_db;
use board_order_core::{
    BoardService, ChangeAction, ChangeRecord, ItemPatch, ItemPayload, RetryConfig,
};
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn file_service(path: &Path) -> BoardService {
    BoardService::new(open_db(path).unwrap(), RetryConfig::default()).unwrap()
}

fn fields(records: &[ChangeRecord]) -> Vec<(ChangeAction, Option<&str>)> {
    records
        .iter()
        .map(|record| (record.action, record.field.as_deref()))
        .collect()
}

#[test]
fn lifecycle_and_field_changes_are_recorded_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let service = file_service(&dir.path().join("board.db"));
    let x = service.create_container(1, "x").unwrap();
    let y = service.create_container(1, "y").unwrap();
    let item = service
        .create_item(x.id, &ItemPayload::titled("card"), 5)
        .unwrap();
    service
        .create_item(y.id, &ItemPayload::titled("other"), 5)
        .unwrap();

    service.move_item(item.id, y.id, 1, 6).unwrap();
    service.delete_item(item.id, 7).unwrap();

    let history = service.item_history(item.id).unwrap();
    assert_eq!(
        fields(&history),
        vec![
            (ChangeAction::Create, None),
            (ChangeAction::Update, Some("container_id")),
            (ChangeAction::Delete, None),
        ]
    );
    assert_eq!(history[1].old_value.as_deref(), Some(x.id.to_string().as_str()));
    assert_eq!(history[1].new_value.as_deref(), Some(y.id.to_string().as_str()));
    assert_eq!(history[1].actor_id, 6);
    assert_eq!(history[2].actor_id, 7);
}

#[test]
fn same_column_move_logs_position_only() {
    let dir = tempfile::tempdir().unwrap();
    let service = file_service(&dir.path().join("board.db"));
    let column = service.create_container(1, "todo").unwrap();
    let first = service
        .create_item(column.id, &ItemPayload::titled("a"), 1)
        .unwrap();
    let second = service
        .create_item(column.id, &ItemPayload::titled("b"), 1)
        .unwrap();

    service.move_item(first.id, column.id, 2, 1).unwrap();

    let history = service.item_history(first.id).unwrap();
    assert_eq!(
        fields(&history),
        vec![
            (ChangeAction::Create, None),
            (ChangeAction::Update, Some("position")),
        ]
    );
    assert_eq!(history[1].old_value.as_deref(), Some("1"));
    assert_eq!(history[1].new_value.as_deref(), Some("2"));

    let shifted = service.item_history(second.id).unwrap();
    assert_eq!(fields(&shifted), vec![(ChangeAction::Create, None)]);
}

#[test]
fn patch_logs_only_changed_fields() {
    let dir = tempfile::tempdir().unwrap();
    let service = file_service(&dir.path().join("board.db"));
    let column = service.create_container(1, "todo").unwrap();
    let item = service
        .create_item(column.id, &ItemPayload::titled("draft"), 1)
        .unwrap();

    service
        .update_item(
            item.id,
            &ItemPatch {
                title: Some("draft".to_string()),
                status: Some("done".to_string()),
                ..ItemPatch::default()
            },
            2,
        )
        .unwrap();

    let history = service.item_history(item.id).unwrap();
    assert_eq!(
        fields(&history),
        vec![
            (ChangeAction::Create, None),
            (ChangeAction::Update, Some("status")),
        ]
    );
    assert_eq!(history[1].old_value.as_deref(), Some(""));
    assert_eq!(history[1].new_value.as_deref(), Some("done"));
}

#[test]
fn change_log_failure_does_not_roll_back_the_move() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.db");
    let service = file_service(&path);
    let column = service.create_container(1, "todo").unwrap();
    let first = service
        .create_item(column.id, &ItemPayload::titled("a"), 1)
        .unwrap();
    let second = service
        .create_item(column.id, &ItemPayload::titled("b"), 1)
        .unwrap();

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER fail_change_log
         BEFORE INSERT ON item_change_log
         BEGIN
             SELECT RAISE(ABORT, 'change log unavailable');
         END;",
    )
    .unwrap();
    drop(conn);

    let moved = service.move_item(first.id, column.id, 2, 1).unwrap();
    assert_eq!(moved.position, 2);

    let order: Vec<_> = service
        .list_items(column.id)
        .unwrap()
        .into_iter()
        .map(|item| item.id)
        .collect();
    assert_eq!(order, vec![second.id, first.id]);

    let history = service.item_history(first.id).unwrap();
    assert_eq!(fields(&history), vec![(ChangeAction::Create, None)]);
}

#[test]
fn failed_change_log_append_is_retried() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("board.db")).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    conn.create_scalar_function("first_append_fails", 0, FunctionFlags::SQLITE_UTF8, move |_| {
        Ok(i64::from(counter.fetch_add(1, Ordering::SeqCst) == 0))
    })
    .unwrap();
    conn.execute_batch(
        "CREATE TRIGGER flaky_change_log
         BEFORE INSERT ON item_change_log
         WHEN first_append_fails() = 1
         BEGIN
             SELECT RAISE(ABORT, 'change log busy');
         END;",
    )
    .unwrap();

    let service = BoardService::new(conn, RetryConfig::default()).unwrap();
    let column = service.create_container(1, "todo").unwrap();
    let item = service
        .create_item(column.id, &ItemPayload::titled("card"), 1)
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let history = service.item_history(item.id).unwrap();
    assert_eq!(fields(&history), vec![(ChangeAction::Create, None)]);
}

#[test]
fn history_of_unknown_item_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let service = file_service(&dir.path().join("board.db"));
    let result = service.item_history(uuid::Uuid::new_v4());
    assert!(matches!(
        result,
        Err(board_order_core::BoardError::ItemNotFound(_))
    ));
}

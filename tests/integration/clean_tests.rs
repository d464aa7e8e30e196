use super::common::{create_db, ids, insert, rows, run, try_run, FIELD};
use rowdupe::error::ExitCode;
use rowdupe::lock::{with_run_lock, LockError};
use rusqlite::Connection;
use tempfile::tempdir;

#[test]
fn test_clean_keeps_newest_per_key() {
    let dir = tempdir().unwrap();
    let db = create_db(
        dir.path(),
        &[
            (1, "a", FIELD),
            (5, "a", FIELD),
            (3, "a", FIELD),
            (2, "b", FIELD),
        ],
    );

    let (code, out) = run(&["clean", "-d", db.to_str().unwrap()]);

    assert_eq!(code, ExitCode::Success);
    assert!(out.contains("Resolved 1 of 1 group(s), deleted 2 record(s)"));
    assert_eq!(
        rows(&db),
        vec![
            (2, "b".to_string(), FIELD.to_string()),
            (5, "a".to_string(), FIELD.to_string()),
        ]
    );
}

#[test]
fn test_clean_without_duplicates_deletes_nothing() {
    let dir = tempdir().unwrap();
    let db = create_db(dir.path(), &[(1, "a", FIELD), (2, "b", FIELD)]);

    let (code, out) = run(&["clean", "-d", db.to_str().unwrap()]);

    assert_eq!(code, ExitCode::NoDuplicates);
    assert!(out.contains("No duplicate"));
    assert_eq!(ids(&db), vec![1, 2]);
}

#[test]
fn test_clean_twice_is_idempotent() {
    let dir = tempdir().unwrap();
    let db = create_db(
        dir.path(),
        &[(1, "a", FIELD), (2, "a", FIELD), (3, "b", FIELD), (4, "b", FIELD)],
    );

    let (first, _) = run(&["clean", "-d", db.to_str().unwrap()]);
    assert_eq!(first, ExitCode::Success);
    let after_first = rows(&db);

    let (count, _) = run(&["count", "-d", db.to_str().unwrap()]);
    assert_eq!(count, ExitCode::NoDuplicates);

    let (second, out) = run(&["clean", "-d", db.to_str().unwrap(), "-o", "json"]);
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(second, ExitCode::NoDuplicates);
    assert_eq!(json["groups_resolved"], 0);
    assert_eq!(rows(&db), after_first);
}

#[test]
fn test_clean_leaves_other_kinds_alone() {
    let dir = tempdir().unwrap();
    let db = create_db(
        dir.path(),
        &[
            (1, "hero", FIELD),
            (2, "hero", FIELD),
            (3, "hero", "page"),
            (4, "hero", "post"),
        ],
    );

    run(&["clean", "-d", db.to_str().unwrap()]);

    assert_eq!(ids(&db), vec![2, 3, 4]);
}

#[test]
fn test_clean_json_report() {
    let dir = tempdir().unwrap();
    let db = create_db(
        dir.path(),
        &[(1, "a", FIELD), (2, "a", FIELD), (3, "b", FIELD), (9, "b", FIELD)],
    );

    let (code, out) = run(&["clean", "-d", db.to_str().unwrap(), "--output", "json"]);
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert_eq!(json["groups_found"], 2);
    assert_eq!(json["groups_resolved"], 2);
    assert_eq!(json["groups_failed"], 0);
    assert_eq!(json["records_deleted"], 2);
    assert_eq!(json["interrupted"], false);
    assert_eq!(json["failures"].as_array().unwrap().len(), 0);
    assert_eq!(ids(&db), vec![2, 9]);
}

#[test]
fn test_clean_snapshot_strategy() {
    let dir = tempdir().unwrap();
    let db = create_db(dir.path(), &[(10, "a", FIELD), (11, "a", FIELD)]);

    let (code, _) = run(&["clean", "-d", db.to_str().unwrap(), "--strategy", "snapshot"]);

    assert_eq!(code, ExitCode::Success);
    assert_eq!(ids(&db), vec![11]);
}

#[test]
fn test_clean_custom_table_layout() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("app.db");
    let conn = Connection::open(&db).unwrap();
    conn.execute_batch(
        "CREATE TABLE items (id INTEGER PRIMARY KEY, slug TEXT, type TEXT);
         INSERT INTO items VALUES (1, 'x', 'import'), (2, 'x', 'import'), (3, 'x', 'manual');",
    )
    .unwrap();
    drop(conn);

    let (code, _) = run(&[
        "clean",
        "-d",
        db.to_str().unwrap(),
        "--table",
        "items",
        "--id-column",
        "id",
        "--key-column",
        "slug",
        "--kind-column",
        "type",
        "--kind",
        "import",
    ]);
    assert_eq!(code, ExitCode::Success);

    let conn = Connection::open(&db).unwrap();
    let remaining: Vec<i64> = conn
        .prepare("SELECT id FROM items ORDER BY id")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .map(Result::unwrap)
        .collect();
    assert_eq!(remaining, vec![2, 3]);
}

#[test]
fn test_clean_refuses_while_locked() {
    let dir = tempdir().unwrap();
    let db = create_db(dir.path(), &[(1, "a", FIELD), (2, "a", FIELD)]);
    let db_arg = db.to_str().unwrap().to_string();

    let result = with_run_lock(&db, || try_run(&["clean", "-d", &db_arg])).unwrap();

    let err = result.unwrap_err();
    assert!(matches!(err.downcast_ref::<LockError>(), Some(LockError::Busy(_))));
    assert_eq!(ExitCode::for_error(&err), ExitCode::Locked);
    assert_eq!(ids(&db), vec![1, 2]);
}

#[test]
fn test_clean_picks_up_rows_added_between_runs() {
    let dir = tempdir().unwrap();
    let db = create_db(dir.path(), &[(1, "a", FIELD), (2, "a", FIELD)]);

    run(&["clean", "-d", db.to_str().unwrap()]);
    insert(&db, 3, "a", FIELD);
    run(&["clean", "-d", db.to_str().unwrap()]);

    assert_eq!(ids(&db), vec![3]);
}

use super::common::{create_db, ids, run, FIELD};
use rowdupe::error::ExitCode;
use tempfile::tempdir;

#[test]
fn test_count_empty_table() {
    let dir = tempdir().unwrap();
    let db = create_db(dir.path(), &[]);

    let (code, out) = run(&["count", "-d", db.to_str().unwrap()]);

    assert_eq!(code, ExitCode::NoDuplicates);
    assert!(out.contains("No duplicate 'acf-field' records."));
}

#[test]
fn test_count_unique_keys() {
    let dir = tempdir().unwrap();
    let db = create_db(dir.path(), &[(1, "field_a", FIELD), (2, "field_b", FIELD)]);

    let (code, _) = run(&["count", "-d", db.to_str().unwrap()]);
    assert_eq!(code, ExitCode::NoDuplicates);
}

#[test]
fn test_count_reports_groups_and_records() {
    let dir = tempdir().unwrap();
    let db = create_db(
        dir.path(),
        &[
            (1, "field_a", FIELD),
            (2, "field_a", FIELD),
            (3, "field_a", FIELD),
            (4, "field_b", FIELD),
            (5, "field_b", FIELD),
            (6, "field_c", FIELD),
        ],
    );

    let (code, out) = run(&["count", "-d", db.to_str().unwrap()]);

    assert_eq!(code, ExitCode::Success);
    assert!(out.contains("2 duplicate group(s) of kind 'acf-field' covering 5 record(s)."));
    assert!(out.contains("would delete 3 record(s)"));
}

#[test]
fn test_count_is_read_only() {
    let dir = tempdir().unwrap();
    let db = create_db(dir.path(), &[(1, "field_a", FIELD), (2, "field_a", FIELD)]);

    run(&["count", "-d", db.to_str().unwrap()]);
    run(&["count", "-d", db.to_str().unwrap(), "-o", "json"]);

    assert_eq!(ids(&db), vec![1, 2]);
}

#[test]
fn test_count_json() {
    let dir = tempdir().unwrap();
    let db = create_db(
        dir.path(),
        &[(1, "field_a", FIELD), (2, "field_a", FIELD), (3, "field_a", "page")],
    );

    let (code, out) = run(&["count", "-d", db.to_str().unwrap(), "--output", "json"]);
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert_eq!(json["kind"], "acf-field");
    assert_eq!(json["duplicate_groups"], 1);
    assert_eq!(json["duplicate_records"], 2);
    assert_eq!(json["surplus_records"], 1);
    assert_eq!(json["exit_code_name"], "RW000");
}

#[test]
fn test_count_other_kind() {
    let dir = tempdir().unwrap();
    let db = create_db(
        dir.path(),
        &[(1, "about", "page"), (2, "about", "page"), (3, "about", FIELD)],
    );

    let (code, _) = run(&["count", "-d", db.to_str().unwrap()]);
    assert_eq!(code, ExitCode::NoDuplicates);

    let (code, out) = run(&["count", "-d", db.to_str().unwrap(), "--kind", "page"]);
    assert_eq!(code, ExitCode::Success);
    assert!(out.contains("1 duplicate group(s) of kind 'page'"));
}

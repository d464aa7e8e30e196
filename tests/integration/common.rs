use rowdupe::cli::Cli;
use rowdupe::error::ExitCode;
use rowdupe::run_app_with_output;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

use clap::Parser;

pub const FIELD: &str = "acf-field";

/// Create `site.db` in `dir` with a WordPress-like posts table.
pub fn create_db(dir: &Path, rows: &[(i64, &str, &str)]) -> PathBuf {
    let path = dir.join("site.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE wp_posts (
            ID INTEGER PRIMARY KEY,
            post_name TEXT NOT NULL,
            post_type TEXT NOT NULL,
            post_title TEXT
        )",
    )
    .unwrap();
    for (id, name, kind) in rows {
        insert(&path, *id, name, kind);
    }
    path
}

pub fn insert(path: &Path, id: i64, name: &str, kind: &str) {
    let conn = Connection::open(path).unwrap();
    conn.execute(
        "INSERT INTO wp_posts (ID, post_name, post_type, post_title) VALUES (?1, ?2, ?3, ?4)",
        params![id, name, kind, format!("Field {id}")],
    )
    .unwrap();
}

/// All rows as (id, name, kind), ordered by id.
pub fn rows(path: &Path) -> Vec<(i64, String, String)> {
    let conn = Connection::open(path).unwrap();
    let mut stmt = conn
        .prepare("SELECT ID, post_name, post_type FROM wp_posts ORDER BY ID")
        .unwrap();
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .unwrap();
    rows.map(Result::unwrap).collect()
}

pub fn ids(path: &Path) -> Vec<i64> {
    rows(path).into_iter().map(|(id, _, _)| id).collect()
}

pub fn try_run(args: &[&str]) -> anyhow::Result<(ExitCode, String)> {
    let mut argv = vec!["rowdupe", "--no-color", "-q"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();
    let mut out = Vec::new();
    let code = run_app_with_output(cli, &mut out)?;
    Ok((code, String::from_utf8(out).unwrap()))
}

pub fn run(args: &[&str]) -> (ExitCode, String) {
    try_run(args).unwrap()
}

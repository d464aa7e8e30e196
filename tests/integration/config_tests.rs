use super::common::{create_db, ids, run, try_run, FIELD};
use clap::Parser;
use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use rowdupe::cli::{Cli, Commands};
use rowdupe::config::{Config, ConfigError};
use rowdupe::error::ExitCode;
use rowdupe::resolver::DeleteStrategy;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_config_load_from_toml() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
database = "/srv/site.db"
kind = "page"
strategy = "snapshot"
busy_timeout_ms = 100

[schema]
table = "posts"
key_column = "slug"
"#,
    )
    .unwrap();

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .extract()
        .unwrap();

    assert_eq!(config.database, Some(PathBuf::from("/srv/site.db")));
    assert_eq!(config.kind, "page");
    assert_eq!(config.strategy, DeleteStrategy::Snapshot);
    assert_eq!(config.busy_timeout_ms, 100);
    assert_eq!(config.schema.table, "posts");
    assert_eq!(config.schema.key_column, "slug");
    // Unset nested keys keep their defaults.
    assert_eq!(config.schema.id_column, "ID");
    assert_eq!(config.schema.kind_column, "post_type");
}

#[test]
fn test_config_invalid_toml() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "strategy = \"sometimes\"").unwrap();

    let result = Config::load(Some(&config_path));
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_config_bad_identifier_rejected() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "[schema]\ntable = \"wp_posts; DROP TABLE wp_users\"\n").unwrap();

    let config = Config::load(Some(&config_path)).unwrap();
    assert!(matches!(config.validate(), Err(ConfigError::Schema(_))));

    let err = try_run(&["--config", config_path.to_str().unwrap(), "count", "-d", "x.db"])
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::Schema(_))
    ));
}

#[test]
fn test_cli_flag_replaces_bad_file_schema() {
    let dir = tempdir().unwrap();
    let db = create_db(dir.path(), &[(1, "a", FIELD), (2, "a", FIELD)]);
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "[schema]\ntable = \"wp posts\"\n").unwrap();

    let (code, _) = run(&[
        "--config",
        config_path.to_str().unwrap(),
        "clean",
        "-d",
        db.to_str().unwrap(),
        "--table",
        "wp_posts",
    ]);

    assert_eq!(code, ExitCode::Success);
    assert_eq!(ids(&db), vec![2]);
}

#[test]
fn test_config_explicit_missing_file() {
    let result = Config::load(Some(std::path::Path::new("/nonexistent/rowdupe.toml")));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[test]
fn test_config_file_supplies_database() {
    let dir = tempdir().unwrap();
    let db = create_db(dir.path(), &[(1, "a", FIELD), (2, "a", FIELD)]);
    let config_path = dir.path().join("rowdupe.toml");
    fs::write(
        &config_path,
        format!("database = {:?}\n", db.to_str().unwrap()),
    )
    .unwrap();

    let (code, _) = run(&["--config", config_path.to_str().unwrap(), "clean"]);

    assert_eq!(code, ExitCode::Success);
    assert_eq!(ids(&db), vec![2]);
}

#[test]
fn test_cli_overrides_config_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("rowdupe.toml");
    fs::write(&config_path, "kind = \"page\"\nstrategy = \"snapshot\"\n").unwrap();

    let mut config = Config::load(Some(&config_path)).unwrap();
    assert_eq!(config.kind, "page");

    let cli = Cli::try_parse_from([
        "rowdupe",
        "clean",
        "--kind",
        "acf-field",
        "--strategy",
        "atomic",
        "-d",
        "x.db",
    ])
    .unwrap();
    config.merge_store_args(cli.store_args());
    if let Commands::Clean(args) = &cli.command {
        config.merge_clean_args(args);
    }

    assert_eq!(config.kind, "acf-field");
    assert_eq!(config.strategy, DeleteStrategy::Atomic);
    assert_eq!(config.database, Some(PathBuf::from("x.db")));
}

#[test]
fn test_missing_database_is_error() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("empty.toml");
    fs::write(&config_path, "").unwrap();

    let err = try_run(&["--config", config_path.to_str().unwrap(), "count"]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::MissingDatabase)
    ));
}

#[test]
fn test_config_subcommand_prints_effective_toml() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("empty.toml");
    fs::write(&config_path, "").unwrap();

    let (code, out) = run(&[
        "--config",
        config_path.to_str().unwrap(),
        "config",
        "--table",
        "posts",
    ]);

    assert_eq!(code, ExitCode::Success);
    let parsed: Config = toml::from_str(&out).unwrap();
    assert_eq!(parsed.schema.table, "posts");
    assert_eq!(parsed.kind, "acf-field");
}

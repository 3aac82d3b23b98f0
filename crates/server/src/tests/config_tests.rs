use super::{normalize_database_url, prepare_database_url, Settings};

use std::{
    collections::HashMap,
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
}

#[test]
fn keeps_memory_and_foreign_urls_untouched() {
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(
        normalize_database_url("postgres://db/easywed"),
        "postgres://db/easywed"
    );
}

#[test]
fn blank_url_falls_back_to_default() {
    assert_eq!(normalize_database_url("  "), Settings::default().database_url);
}

#[test]
fn normalizes_windows_plain_path_with_single_sqlite_colon() {
    assert_eq!(
        normalize_database_url("C:\\Users\\alice\\test.db"),
        "sqlite:C:/Users/alice/test.db"
    );
}

#[test]
fn converts_sqlite_double_slash_windows_path() {
    assert_eq!(
        normalize_database_url("sqlite://C:/Users/alice/test.db"),
        "sqlite:C:/Users/alice/test.db"
    );
}

#[test]
fn creates_parent_dir_for_relative_sqlite_url() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();

    let temp_root = env::temp_dir().join(format!("easywed_server_test_{suffix}"));
    let db_path = temp_root.join("data").join("test.db");

    prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare db url");
    assert!(temp_root.join("data").exists());

    fs::remove_dir_all(temp_root).expect("cleanup");
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    settings.apply_file(
        r#"
        bind_addr = "0.0.0.0:8080"
        jwt_secret = "from-file"
        token_ttl_seconds = "60"
        "#,
    );
    assert_eq!(settings.server_bind, "0.0.0.0:8080");
    assert_eq!(settings.jwt_secret.as_deref(), Some("from-file"));
    assert_eq!(settings.token_ttl_seconds, 60);
    assert_eq!(settings.database_url, Settings::default().database_url);
}

#[test]
fn prefixed_env_names_win_over_legacy_names() {
    let env: HashMap<&str, &str> = HashMap::from([
        ("EASYWED_SECRET", "legacy"),
        ("APP__JWT_SECRET", "prefixed"),
        ("EASYWED_PWD", "admin-pass"),
        ("APP__TOKEN_TTL_SECONDS", "not-a-number"),
    ]);
    let mut settings = Settings::default();
    settings.apply_env(|name| env.get(name).map(|v| v.to_string()));

    assert_eq!(settings.jwt_secret.as_deref(), Some("prefixed"));
    assert_eq!(settings.admin_password.as_deref(), Some("admin-pass"));
    assert_eq!(
        settings.token_ttl_seconds,
        Settings::default().token_ttl_seconds
    );
}

#[test]
fn blank_jwt_secret_is_rejected() {
    let mut settings = Settings::default();
    assert!(settings.require_jwt_secret().is_err());
    settings.jwt_secret = Some("   ".into());
    assert!(settings.require_jwt_secret().is_err());
    settings.jwt_secret = Some("s3cret".into());
    assert_eq!(settings.require_jwt_secret().expect("secret"), "s3cret");
}

#[tokio::test]
async fn prepared_database_url_creates_openable_sqlite_file() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();

    let temp_root = env::temp_dir().join(format!("easywed_server_open_test_{suffix}"));
    let db_path = temp_root.join("nested").join("server.db");

    let prepared = prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare");
    let storage = storage::Storage::new(&prepared).await.expect("open sqlite");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should be created: {}",
        db_path.display()
    );

    fs::remove_dir_all(temp_root).expect("cleanup");
}

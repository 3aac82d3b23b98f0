use super::*;

fn session() -> GuestSession {
    GuestSession {
        user_name: "penelope".into(),
        guest_id: GuestId::from("g-1"),
        auth_token: "secret-token".into(),
    }
}

#[test]
fn debug_output_hides_token() {
    let rendered = format!("{:?}", session());
    assert!(rendered.contains("penelope"));
    assert!(!rendered.contains("secret-token"));
}

#[test]
fn file_store_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("session.json");

    FileSessionStore::new(&path).save(&session()).expect("save");

    let reopened = FileSessionStore::new(&path);
    assert_eq!(reopened.load(), Some(session()));
    let raw = std::fs::read_to_string(&path).expect("read");
    let entries: BTreeMap<String, String> = serde_json::from_str(&raw).expect("json");
    assert_eq!(entries.get("jwt_token").map(String::as_str), Some("secret-token"));
}

#[test]
fn file_store_treats_missing_or_broken_files_as_absent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session.json");
    let store = FileSessionStore::new(&path);
    assert!(store.load().is_none());

    std::fs::write(&path, "{not json").expect("write");
    assert!(store.load().is_none());

    std::fs::write(&path, r#"{"user_name":"penelope","id":"g-1"}"#).expect("write");
    assert!(store.load().is_none());
}

#[test]
fn file_store_clear_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileSessionStore::new(dir.path().join("session.json"));
    store.save(&session()).expect("save");

    store.clear().expect("clear");
    store.clear().expect("clear again");

    assert!(store.load().is_none());
    assert!(!store.path().exists());
}

#[test]
fn memory_store_save_overwrites_and_clear_removes_all_keys() {
    let store = MemorySessionStore::with_entries([("user_name", "odysseus"), ("theme", "dark")]);
    assert!(store.load().is_none());

    store.save(&session()).expect("save");
    assert_eq!(store.load(), Some(session()));

    store.clear().expect("clear");
    assert!(store.load().is_none());
    assert_eq!(
        store.entries().get("theme").map(String::as_str),
        Some("dark")
    );
}

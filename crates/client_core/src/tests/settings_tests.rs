use super::*;

#[test]
fn defaults_point_at_local_server() {
    let settings = ClientSettings::default();
    assert_eq!(settings.api_base_url, DEFAULT_API_BASE_URL);
    assert!(settings.session_file.ends_with("easywed/session.json"));
}

#[test]
fn file_values_apply_and_flags_win() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(
        &config,
        "api_base_url = \"https://rsvp.example.org/api\"\nsession_file = \"/tmp/rsvp-session.json\"\n",
    )
    .expect("write");

    let from_file = ClientSettings::load(&config, None, None);
    assert_eq!(from_file.api_base_url, "https://rsvp.example.org/api");
    assert_eq!(from_file.session_file, PathBuf::from("/tmp/rsvp-session.json"));

    let overridden = ClientSettings::load(
        &config,
        Some("http://localhost:9000/api".into()),
        Some(PathBuf::from("elsewhere.json")),
    );
    assert_eq!(overridden.api_base_url, "http://localhost:9000/api");
    assert_eq!(overridden.session_file, PathBuf::from("elsewhere.json"));
}

#[test]
fn missing_or_malformed_file_keeps_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = ClientSettings::load(&dir.path().join("absent.toml"), None, None);
    assert_eq!(missing, ClientSettings::default());

    let broken = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&broken, "api_base_url = [").expect("write");
    assert_eq!(
        ClientSettings::load(&broken, Some("  ".into()), None),
        ClientSettings::default()
    );
}

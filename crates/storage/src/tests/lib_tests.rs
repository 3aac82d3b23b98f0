use super::*;

fn sample_record() -> GuestRecord {
    GuestRecord {
        invitees: 3,
        modification: String::new(),
        food_requirements: "none".into(),
        needs_accomodation: true,
        needs_passage: false,
        confirmed: true,
    }
}

async fn insert_guest(storage: &Storage, user_name: &str) -> GuestId {
    let record = sample_record();
    storage
        .create_guest(&NewGuestRow {
            user_name,
            password_hash: "hash",
            country: "GR",
            language: "el",
            record: &record,
            auth_code: AuthCode::GUEST,
        })
        .await
        .expect("insert")
        .expect("fresh user name")
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn stores_and_reads_guest_by_name_and_id() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let id = insert_guest(&storage, "telemachus").await;

    let by_name = storage
        .guest_by_user_name("telemachus")
        .await
        .expect("query")
        .expect("guest");
    assert_eq!(by_name.id, id);
    assert_eq!(by_name.record, sample_record());
    assert_eq!(by_name.auth_code, AuthCode::GUEST);

    let by_id = storage.guest_by_id(&id).await.expect("query").expect("guest");
    assert_eq!(by_id.user_name, "telemachus");
    assert_eq!(by_id.country, "GR");

    assert!(storage
        .guest_by_user_name("nobody")
        .await
        .expect("query")
        .is_none());
}

#[tokio::test]
async fn duplicate_user_name_is_rejected_without_error() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    insert_guest(&storage, "penelope").await;

    let record = sample_record();
    let second = storage
        .create_guest(&NewGuestRow {
            user_name: "penelope",
            password_hash: "other",
            country: "",
            language: "",
            record: &record,
            auth_code: AuthCode::GUEST,
        })
        .await
        .expect("insert");
    assert!(second.is_none());
    assert_eq!(storage.list_guests().await.expect("list").len(), 1);
}

#[tokio::test]
async fn update_changes_only_editable_fields() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let id = insert_guest(&storage, "telemachus").await;

    let edited = GuestRecord {
        invitees: 40,
        modification: "Mum is coming".into(),
        food_requirements: "Mum is vegetarian".into(),
        needs_accomodation: false,
        needs_passage: true,
        confirmed: false,
    };
    assert!(storage.update_guest_details(&id, &edited).await.expect("update"));

    let stored = storage.guest_by_id(&id).await.expect("query").expect("guest");
    assert_eq!(stored.record.invitees, 3);
    assert_eq!(stored.record.modification, "Mum is coming");
    assert_eq!(stored.record.food_requirements, "Mum is vegetarian");
    assert!(!stored.record.needs_accomodation);
    assert!(stored.record.needs_passage);
    assert!(!stored.record.confirmed);
    assert_eq!(stored.password_hash, "hash");
}

#[tokio::test]
async fn update_of_unknown_guest_reports_missing() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let updated = storage
        .update_guest_details(&GuestId::from("missing"), &sample_record())
        .await
        .expect("update");
    assert!(!updated);
}

#[tokio::test]
async fn tokens_can_be_recorded_and_revoked() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .insert_token("tok-1", "telemachus", AuthCode::GUEST)
        .await
        .expect("insert");

    let token = storage.token("tok-1").await.expect("query").expect("token");
    assert!(token.valid);
    assert_eq!(token.user_name, "telemachus");
    assert_eq!(token.auth_code, AuthCode::GUEST);

    assert!(storage.set_token_validity("tok-1", false).await.expect("revoke"));
    let token = storage.token("tok-1").await.expect("query").expect("token");
    assert!(!token.valid);
}

#[tokio::test]
async fn insert_token_rejects_invalid_input() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    assert!(storage.insert_token("", "u", AuthCode::GUEST).await.is_err());
    assert!(storage.insert_token("t", "", AuthCode::GUEST).await.is_err());
    assert!(storage.insert_token("t", "u", AuthCode(1)).await.is_err());
}

#[tokio::test]
async fn revoke_tokens_for_user_only_touches_that_user() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.insert_token("a1", "alice", AuthCode::GUEST).await.expect("a1");
    storage.insert_token("a2", "alice", AuthCode::GUEST).await.expect("a2");
    storage.insert_token("b1", "bob", AuthCode::GUEST).await.expect("b1");

    assert_eq!(storage.revoke_tokens_for_user("alice").await.expect("revoke"), 2);
    assert!(storage.token("b1").await.expect("query").expect("token").valid);
}

use serde::{Deserialize, Serialize};

use crate::domain::GuestId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequest {
    pub user_name: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user_name: String,
    pub id: GuestId,
    pub jwt_token: String,
}

/// Attendance details of one invited party. The field spelling of
/// `needs_accomodation` is part of the wire format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuestRecord {
    pub invitees: u32,
    pub modification: String,
    pub food_requirements: String,
    pub needs_accomodation: bool,
    pub needs_passage: bool,
    pub confirmed: bool,
}

/// A guest as returned by the lookup endpoints. The password hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    pub id: GuestId,
    pub user_name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub language: String,
    #[serde(flatten)]
    pub record: GuestRecord,
}

/// Body of `PUT /api/guests/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestUpdate {
    pub id: GuestId,
    pub user_name: String,
    #[serde(flatten)]
    pub record: GuestRecord,
}

/// Body of `POST /api/guests`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGuest {
    pub user_name: String,
    pub password: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub language: String,
    #[serde(flatten)]
    pub record: GuestRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_body_is_flat_and_carries_identity() {
        let update = GuestUpdate {
            id: GuestId::from("abc"),
            user_name: "telemachus".into(),
            record: GuestRecord {
                invitees: 2,
                needs_accomodation: true,
                ..GuestRecord::default()
            },
        };
        let value = serde_json::to_value(&update).expect("json");
        assert_eq!(value["id"], "abc");
        assert_eq!(value["user_name"], "telemachus");
        assert_eq!(value["invitees"], 2);
        assert_eq!(value["needs_accomodation"], true);
        assert_eq!(value["needs_passage"], false);
        assert!(value.get("record").is_none());
    }

    #[test]
    fn lookup_response_tolerates_missing_optional_fields() {
        let guest: Guest = serde_json::from_str(
            r#"{"id":"g1","user_name":"penelope","invitees":3,"confirmed":true}"#,
        )
        .expect("guest");
        assert_eq!(guest.record.invitees, 3);
        assert!(guest.record.confirmed);
        assert!(guest.record.food_requirements.is_empty());
        assert!(guest.country.is_empty());
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-side identifier of a guest's RSVP record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestId(pub String);

impl GuestId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GuestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

pub const ADMIN_USER_NAME: &str = "admin";

/// Protected API operations. Each one is identified by a distinct prime so that
/// a set of grants can be encoded as the product of the granted codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiCode {
    ReadGuest,
    UpdateGuest,
    CreateGuest,
    ReadAll,
}

impl ApiCode {
    pub const ALL: [ApiCode; 4] = [
        ApiCode::ReadGuest,
        ApiCode::UpdateGuest,
        ApiCode::CreateGuest,
        ApiCode::ReadAll,
    ];

    pub const fn value(self) -> u32 {
        match self {
            ApiCode::ReadGuest => 2,
            ApiCode::UpdateGuest => 3,
            ApiCode::CreateGuest => 5,
            ApiCode::ReadAll => 7,
        }
    }
}

/// Product of the [`ApiCode`]s a principal is allowed to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthCode(pub u32);

impl AuthCode {
    /// Read and update of the caller's own record.
    pub const GUEST: AuthCode = AuthCode(2 * 3);
    pub const ADMIN: AuthCode = AuthCode(2 * 3 * 5 * 7);

    pub fn from_grants(grants: &[ApiCode]) -> Self {
        let mut code = 1;
        for grant in grants {
            if code % grant.value() != 0 {
                code *= grant.value();
            }
        }
        AuthCode(code)
    }

    /// A code is usable when it grants at least one API.
    pub fn is_valid(self) -> bool {
        if self.0 <= 1 {
            return false;
        }
        ApiCode::ALL.iter().any(|api| self.0 % api.value() == 0)
    }

    pub fn permits(self, api: ApiCode) -> bool {
        let code = api.value();
        code <= self.0 && self.0 % code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_code_allows_read_and_update_only() {
        assert!(AuthCode::GUEST.permits(ApiCode::ReadGuest));
        assert!(AuthCode::GUEST.permits(ApiCode::UpdateGuest));
        assert!(!AuthCode::GUEST.permits(ApiCode::CreateGuest));
        assert!(!AuthCode::GUEST.permits(ApiCode::ReadAll));
    }

    #[test]
    fn admin_code_allows_everything() {
        for api in ApiCode::ALL {
            assert!(AuthCode::ADMIN.permits(api), "{api:?}");
        }
    }

    #[test]
    fn trivial_and_unrelated_codes_are_invalid() {
        assert!(!AuthCode(0).is_valid());
        assert!(!AuthCode(1).is_valid());
        assert!(!AuthCode(11).is_valid());
        assert!(AuthCode(14).is_valid());
    }

    #[test]
    fn from_grants_ignores_duplicates() {
        let code = AuthCode::from_grants(&[ApiCode::ReadGuest, ApiCode::ReadGuest, ApiCode::UpdateGuest]);
        assert_eq!(code, AuthCode::GUEST);
    }
}

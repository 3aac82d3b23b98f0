//! View model of the guest page.
//!
//! The page holds a login form, an RSVP form and a confirmation modal. Which of the
//! two forms is visible is decided in one place, [`Page::render`], from the
//! [`SessionState`]; nothing else toggles visibility.

use shared::protocol::GuestRecord;

use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub visible: bool,
    pub error: Option<String>,
}

/// Editable RSVP fields. The invitee count comes from the server and is locked once filled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RsvpForm {
    pub visible: bool,
    invitees: Option<u32>,
    pub modification: String,
    pub food_requirements: String,
    pub needs_accommodation: bool,
    pub needs_passage: bool,
    pub confirmed: bool,
    pub error: Option<String>,
    pub retry_available: bool,
}

impl RsvpForm {
    /// Copies a fetched record into the fields, mapping the booleans to checkbox states.
    pub fn fill_from(&mut self, record: &GuestRecord) {
        self.invitees = Some(record.invitees);
        self.modification = record.modification.clone();
        self.food_requirements = record.food_requirements.clone();
        self.needs_accommodation = record.needs_accomodation;
        self.needs_passage = record.needs_passage;
        self.confirmed = record.confirmed;
        self.error = None;
        self.retry_available = false;
    }

    pub fn invitees(&self) -> Option<u32> {
        self.invitees
    }

    pub fn invitees_editable(&self) -> bool {
        self.invitees.is_none()
    }

    pub fn set_invitees(&mut self, value: u32) -> Result<(), SessionError> {
        if !self.invitees_editable() {
            return Err(SessionError::ReadOnlyField("invitees"));
        }
        self.invitees = Some(value);
        Ok(())
    }

    pub fn to_record(&self) -> GuestRecord {
        GuestRecord {
            invitees: self.invitees.unwrap_or_default(),
            modification: self.modification.clone(),
            food_requirements: self.food_requirements.clone(),
            needs_accomodation: self.needs_accommodation,
            needs_passage: self.needs_passage,
            confirmed: self.confirmed,
        }
    }

    fn reset(&mut self) {
        *self = Self {
            visible: self.visible,
            ..Self::default()
        };
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmationModal {
    pub open: bool,
}

impl ConfirmationModal {
    pub fn close(&mut self) {
        self.open = false;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub login: LoginForm,
    pub rsvp: RsvpForm,
    pub confirmation: ConfirmationModal,
}

impl Page {
    pub fn render(&mut self, state: SessionState) {
        match state {
            SessionState::Unauthenticated => {
                self.login.visible = true;
                self.rsvp.visible = false;
                self.rsvp.reset();
                self.confirmation.close();
            }
            SessionState::Authenticated => {
                self.login.visible = false;
                self.login.error = None;
                self.rsvp.visible = true;
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/page_tests.rs"]
mod tests;

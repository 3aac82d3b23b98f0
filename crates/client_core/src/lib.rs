use shared::protocol::GuestUpdate;
use tracing::{info, warn};

pub mod api_client;
pub mod error;
pub mod page;
pub mod session_store;
pub mod settings;

pub use api_client::{GuestApi, HttpGuestApi};
pub use error::{ApiFailure, SessionError, StoreError};
pub use page::{ConfirmationModal, LoginForm, Page, RsvpForm, SessionState};
pub use session_store::{FileSessionStore, GuestSession, MemorySessionStore, SessionStore};
pub use settings::ClientSettings;

/// User-triggered fetch retries allowed per page load.
pub const MAX_MANUAL_FETCH_RETRIES: u32 = 3;

/// Drives the guest page: decides between login and RSVP, loads the guest record
/// and submits edits. The store is the only place the session is read from or written to.
pub struct GuestSessionController<S: SessionStore, A: GuestApi> {
    store: S,
    api: A,
    page: Page,
    state: SessionState,
    session: Option<GuestSession>,
    fetch_retries: u32,
}

impl<S: SessionStore, A: GuestApi> GuestSessionController<S, A> {
    pub fn new(store: S, api: A) -> Self {
        Self {
            store,
            api,
            page: Page::default(),
            state: SessionState::Unauthenticated,
            session: None,
            fetch_retries: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Form fields the user edits before [`Self::submit_rsvp`].
    pub fn rsvp_form_mut(&mut self) -> &mut RsvpForm {
        &mut self.page.rsvp
    }

    pub fn session(&self) -> Option<&GuestSession> {
        self.session.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Page-load entry point. With a complete stored session the RSVP form is shown and
    /// the guest record is fetched once; otherwise the login form is shown.
    ///
    /// A failed fetch is reported on the page, not returned.
    pub async fn determine_session_state(&mut self) -> SessionState {
        self.fetch_retries = 0;
        self.session = self.store.load();
        if self.session.is_none() {
            self.transition(SessionState::Unauthenticated);
            return self.state;
        }

        self.transition(SessionState::Authenticated);
        if let Err(error) = self.fetch_guest_record().await {
            warn!(%error, "session: guest record unavailable after page load");
        }
        self.state
    }

    /// Exchanges credentials for a session, stores it and reloads the page state.
    /// On failure the stored session is left untouched and the login form shows the error.
    pub async fn login(
        &mut self,
        user_name: &str,
        password: &str,
    ) -> Result<SessionState, SessionError> {
        let auth = match self.api.authenticate(user_name, password).await {
            Ok(auth) => auth,
            Err(failure) => {
                warn!(user_name, error = %failure, "session: login rejected");
                self.page.login.error = Some(failure_message(&failure));
                return Err(SessionError::Authentication(failure));
            }
        };

        let session = GuestSession {
            user_name: auth.user_name,
            guest_id: auth.id,
            auth_token: auth.jwt_token,
        };
        if let Err(error) = self.store.save(&session) {
            warn!(user_name = %session.user_name, %error, "session: could not store session");
            self.page.login.error = Some(error.to_string());
            return Err(error.into());
        }
        info!(user_name = %session.user_name, guest_id = %session.guest_id, "session: logged in");

        Ok(self.determine_session_state().await)
    }

    pub async fn fetch_guest_record(&mut self) -> Result<(), SessionError> {
        let session = self
            .session
            .as_ref()
            .ok_or(SessionError::NotAuthenticated)?;

        match self.api.fetch_guest(session).await {
            Ok(record) => {
                self.page.rsvp.fill_from(&record);
                info!(user_name = %session.user_name, "session: guest record loaded");
                Ok(())
            }
            Err(failure) if failure.is_unauthorized() => {
                warn!(user_name = %session.user_name, error = %failure, "session: token refused, signing out");
                self.drop_session()?;
                self.page.login.error = Some(failure_message(&failure));
                Err(SessionError::Fetch(failure))
            }
            Err(failure) => {
                warn!(user_name = %session.user_name, error = %failure, "session: guest record fetch failed");
                self.page.rsvp.error = Some(failure_message(&failure));
                self.page.rsvp.retry_available = self.fetch_retries < MAX_MANUAL_FETCH_RETRIES;
                Err(SessionError::Fetch(failure))
            }
        }
    }

    /// User-triggered retry after a failed fetch, bounded by [`MAX_MANUAL_FETCH_RETRIES`].
    /// Without a pending failure this is a no-op, so loaded edits are never overwritten.
    pub async fn retry_fetch_guest_record(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Authenticated {
            return Err(SessionError::NotAuthenticated);
        }
        if self.fetch_retries >= MAX_MANUAL_FETCH_RETRIES {
            self.page.rsvp.retry_available = false;
            return Err(SessionError::RetryExhausted(MAX_MANUAL_FETCH_RETRIES));
        }
        if !self.page.rsvp.retry_available {
            return Ok(());
        }
        self.fetch_retries += 1;
        self.fetch_guest_record().await
    }

    /// Sends the form with the stored identity. Edits survive a failure so the user can resubmit.
    pub async fn submit_rsvp(&mut self) -> Result<(), SessionError> {
        let session = self
            .session
            .as_ref()
            .ok_or(SessionError::NotAuthenticated)?;
        let update = GuestUpdate {
            id: session.guest_id.clone(),
            user_name: session.user_name.clone(),
            record: self.page.rsvp.to_record(),
        };

        match self.api.update_guest(session, &update).await {
            Ok(()) => {
                info!(
                    user_name = %session.user_name,
                    confirmed = update.record.confirmed,
                    "session: rsvp submitted"
                );
                self.page.rsvp.error = None;
                self.page.confirmation.open = true;
                Ok(())
            }
            Err(failure) => {
                warn!(user_name = %session.user_name, error = %failure, "session: rsvp submit failed");
                self.page.rsvp.error = Some(failure_message(&failure));
                Err(SessionError::Submit(failure))
            }
        }
    }

    pub fn close_confirmation(&mut self) {
        self.page.confirmation.close();
    }

    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.drop_session()?;
        info!("session: logged out");
        Ok(())
    }

    /// The store is cleared first; if that fails the page stays put and shows the error.
    fn drop_session(&mut self) -> Result<(), SessionError> {
        if let Err(error) = self.store.clear() {
            warn!(%error, "session: could not clear stored session");
            self.page.rsvp.error = Some(error.to_string());
            return Err(error.into());
        }
        self.session = None;
        self.fetch_retries = 0;
        self.transition(SessionState::Unauthenticated);
        Ok(())
    }

    fn transition(&mut self, state: SessionState) {
        self.state = state;
        self.page.render(state);
    }
}

fn failure_message(failure: &ApiFailure) -> String {
    match failure {
        ApiFailure::Rejected { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

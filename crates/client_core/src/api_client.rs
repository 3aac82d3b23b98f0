use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    error::ApiError,
    protocol::{AuthRequest, AuthResponse, GuestRecord, GuestUpdate},
};
use url::Url;

use crate::{error::ApiFailure, session_store::GuestSession};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const GUEST_ACCEPT: &str = "text/json";

/// The three calls the guest page makes against the remote API.
#[async_trait]
pub trait GuestApi: Send + Sync {
    async fn authenticate(&self, user_name: &str, password: &str)
        -> Result<AuthResponse, ApiFailure>;
    /// Only the RSVP fields of the lookup response are read.
    async fn fetch_guest(&self, session: &GuestSession) -> Result<GuestRecord, ApiFailure>;
    async fn update_guest(
        &self,
        session: &GuestSession,
        update: &GuestUpdate,
    ) -> Result<(), ApiFailure>;
}

#[derive(Debug, Clone)]
pub struct HttpGuestApi {
    http: Client,
    base_url: Url,
}

impl HttpGuestApi {
    /// `base_url` is the API root, e.g. `http://127.0.0.1:5000/api`.
    pub fn new(base_url: &str) -> Result<Self, ApiFailure> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ApiFailure> {
        let mut raw = base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url =
            Url::parse(&raw).map_err(|e| ApiFailure::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiFailure::InvalidUrl(base_url.to_string()));
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiFailure::Transport)?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiFailure> {
        self.base_url
            .join(path)
            .map_err(|e| ApiFailure::InvalidUrl(format!("{path}: {e}")))
    }

    fn guest_url(&self, session: &GuestSession) -> Result<Url, ApiFailure> {
        let mut url = self.endpoint("guests")?;
        url.path_segments_mut()
            .map_err(|()| ApiFailure::InvalidUrl(self.base_url.to_string()))?
            .push(session.guest_id.as_str());
        Ok(url)
    }
}

#[async_trait]
impl GuestApi for HttpGuestApi {
    async fn authenticate(
        &self,
        user_name: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiFailure> {
        let response = self
            .http
            .post(self.endpoint("auth")?)
            .json(&AuthRequest {
                user_name: user_name.to_string(),
                password: password.to_string(),
            })
            .send()
            .await
            .map_err(ApiFailure::Transport)?;
        decode(check(response).await?).await
    }

    async fn fetch_guest(&self, session: &GuestSession) -> Result<GuestRecord, ApiFailure> {
        let mut url = self.endpoint("guests")?;
        url.query_pairs_mut()
            .append_pair("user_name", &session.user_name);
        let response = self
            .http
            .get(url)
            .bearer_auth(&session.auth_token)
            .header(header::ACCEPT, GUEST_ACCEPT)
            .send()
            .await
            .map_err(ApiFailure::Transport)?;
        decode(check(response).await?).await
    }

    async fn update_guest(
        &self,
        session: &GuestSession,
        update: &GuestUpdate,
    ) -> Result<(), ApiFailure> {
        let response = self
            .http
            .put(self.guest_url(session)?)
            .bearer_auth(&session.auth_token)
            .header(header::ACCEPT, GUEST_ACCEPT)
            .json(update)
            .send()
            .await
            .map_err(ApiFailure::Transport)?;
        // Only success or failure is observed; the acknowledgment body is ignored.
        check(response).await.map(drop)
    }
}

/// Turns a non-2xx response into `ApiFailure::Rejected`, preferring the server's error message.
async fn check(response: Response) -> Result<Response, ApiFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&body)
        .map(|err| err.message)
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        });
    Err(ApiFailure::Rejected {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiFailure> {
    response.json().await.map_err(ApiFailure::Decode)
}

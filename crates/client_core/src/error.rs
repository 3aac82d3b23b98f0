use thiserror::Error;

/// Failure of a single call to the guest API.
#[derive(Debug, Error)]
pub enum ApiFailure {
    #[error("invalid api url: {0}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(#[source] reqwest::Error),
}

impl ApiFailure {
    /// The server refused the credential itself, as opposed to a transient failure.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiFailure::Rejected { status: 401 | 403, .. })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("login failed: {0}")]
    Authentication(#[source] ApiFailure),
    #[error("could not load guest record: {0}")]
    Fetch(#[source] ApiFailure),
    #[error("could not submit rsvp: {0}")]
    Submit(#[source] ApiFailure),
    #[error("no guest session")]
    NotAuthenticated,
    #[error("retry limit of {0} reached")]
    RetryExhausted(u32),
    #[error("field '{0}' is read-only")]
    ReadOnlyField(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

use thiserror::Error;

/// Failure of a single fetch. The frontier turns every one of these into a
/// skipped page; they never escape a crawl.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else if err.is_connect() {
            FetchError::Connect(err.to_string())
        } else if err.is_body() || err.is_decode() {
            FetchError::Body(err.to_string())
        } else {
            FetchError::Request(err.to_string())
        }
    }
}

/// Errors that abort the requested audit operation.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("invalid seed URL '{url}': {reason}")]
    InvalidSeed { url: String, reason: String },

    #[error("crawl of {seed} produced no pages")]
    EmptyCrawl { seed: String },

    #[error("page not found in crawl: {0}")]
    PageNotFound(String),
}

pub type Result<T> = std::result::Result<T, AuditError>;

use thiserror::Error;

/// Failures of the remote identity lookup. All are absorbed by the
/// resolver; none aborts a fill cascade.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("lookup timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected HTTP status: {0}")]
    Http(u16),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("service returned no username")]
    EmptyUsername,
}

/// Failures reported by a document backend.
#[derive(Debug, Error)]
pub enum DomError {
    #[error("element not found: {id}")]
    ElementNotFound { id: u32 },

    #[error("element disabled: {id}")]
    ElementDisabled { id: u32 },

    #[error("{0}")]
    Other(String),
}

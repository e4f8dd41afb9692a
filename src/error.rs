//! Error taxonomy for the indexing and query paths.
//!
//! Errors are caught at two places only: the per-repository boundary in
//! [`crate::indexer`] and the endpoint boundary in [`crate::server`].

use thiserror::Error;

/// Failure talking to the upstream hosting API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Network failure, timeout, or connection reset.
    #[error("upstream transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The upstream answered with a non-2xx status.
    #[error("upstream returned HTTP {status} for {url}: {body}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    /// The body did not have the expected shape.
    #[error("malformed upstream response from {url}: {reason}")]
    Malformed { url: String, reason: String },
}

/// Connection or write failure against the `pull_requests` table.
#[derive(Debug, Error)]
#[error("storage error: {0}")]
pub struct StorageError(#[from] pub sqlx::Error);

/// Reason indexing of a single repository was aborted.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The indexing task for the named repository panicked.
    #[error("indexing task for {0} did not complete")]
    TaskFailed(String),
}

/// Rejected `[start, end]` window input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("invalid date '{0}': expected RFC 3339, YYYY-MM-DDTHH:MM:SS or YYYY-MM-DD")]
    InvalidDate(String),

    #[error("window start {start} is after end {end}")]
    Inverted { start: String, end: String },
}

use thiserror::Error;

/// Errors raised while collecting and forwarding report lines.
///
/// Most variants are scoped: a fetch error loses one source for one
/// cycle, a store error loses one line, a publish error loses one
/// delivery attempt. Only `FatalAuthFailure` escapes the cycle, because
/// rejected credentials will not heal on retry.
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("failed to fetch report: {0}")]
    FetchFailed(#[from] reqwest::Error),

    #[error("report endpoint returned {status}")]
    NonOkStatus { status: reqwest::StatusCode },

    #[error("dedup store unavailable: {0}")]
    DedupStoreUnavailable(String),

    #[error("failed to publish line: {0}")]
    PublishFailed(String),

    #[error("credentials rejected: {0}")]
    FatalAuthFailure(String),
}

impl CollectError {
    /// True for errors that must stop the polling loop instead of being
    /// absorbed by the current cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CollectError::FatalAuthFailure(_))
    }
}

use thiserror::Error;

/// Errors that can abort an allocation round.
///
/// Every variant is fatal: the round halts and nothing is disbursed after
/// the error is raised.
#[derive(Error, Debug)]
pub enum SplitError {
    /// Malformed or out-of-range input (bad rows, too few contributors, `sent > sent_max`)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Redistributed votes do not add up to `sent_max * contributor_count`
    #[error("Normalization invariant violated: {0}")]
    NormalizationInvariantViolation(String),

    /// Dust out of bounds, allocation sum mismatch, or a failed unit reconstruction
    #[error("Allocation invariant violated: {0}")]
    AllocationInvariantViolation(String),

    /// The disbursement sink rejected or failed the batch
    #[error("Disbursement failed: {0}")]
    Disbursement(String),

    /// The vote source could not be read
    #[error("Vote source error: {0}")]
    Source(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type SplitResult<T> = Result<T, SplitError>;

impl From<csv::Error> for SplitError {
    fn from(err: csv::Error) -> Self {
        SplitError::InvalidInput(format!("unreadable vote record: {}", err))
    }
}

impl From<reqwest::Error> for SplitError {
    fn from(err: reqwest::Error) -> Self {
        SplitError::Source(err.to_string())
    }
}

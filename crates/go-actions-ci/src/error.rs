//! Error types for job execution, result storage and comment publishing.

use thiserror::Error;

use go_actions_core::{CoreError, JobKind};

/// Errors from running a job.
#[derive(Error, Debug)]
pub enum CiError {
    /// The `job` input named something this action cannot run.
    #[error("Invalid job type: {job}. Valid options are: {valid}")]
    UnknownJob { job: String, valid: String },

    /// An input failed to parse.
    #[error("Invalid input '{name}': {reason}")]
    InvalidInput { name: String, reason: String },

    /// The job ran and its command failed. The failure result has already
    /// been handed to the result store.
    #[error("CI job '{job}' failed: {message}")]
    JobFailed { job: JobKind, message: String },

    /// Workflow validation found error-severity problems.
    #[error("Validation failed with {0} error(s)")]
    ValidationFailed(usize),

    /// Writing a runner file (`GITHUB_OUTPUT`, `GITHUB_ENV`, ...) failed.
    #[error("Failed to write workflow command file: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Errors from persisting or loading a job result.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored record carries a different job than the slot it was found in.
    #[error("Stored record for {found} found under {expected}")]
    MismatchedJob { expected: JobKind, found: JobKind },
}

/// Errors from the GitHub comments API.
#[derive(Error, Debug)]
pub enum CommentError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("GitHub API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid repository '{0}', expected owner/repo")]
    InvalidRepository(String),
}

impl From<reqwest::Error> for CommentError {
    fn from(err: reqwest::Error) -> Self {
        CommentError::Http(err.to_string())
    }
}

/// Result type for job execution.
pub type Result<T> = std::result::Result<T, CiError>;

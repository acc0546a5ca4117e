use std::io;
use thiserror::Error;

/// Errors that can occur during git operations
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Not a git repository")]
    NotARepository,

    #[error("Failed to launch git: {0}")]
    LaunchFailed(String),

    #[error("Git command `{command}` failed with exit code {exit_code}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("Failed to parse git output: {0}")]
    ParseError(String),

    #[error("Remote operation failed: {0}")]
    RelayFailed(String),

    #[error("Nothing to commit: {0}")]
    NothingToCommit(String),

    #[error("Git command `{command}` produced more than {limit} bytes of output")]
    OutputOverflow { command: String, limit: usize },

    #[error("Git command `{command}` did not finish within {seconds}s")]
    Timeout { command: String, seconds: u64 },

    #[error("Git version {0} is too old. Minimum required: 1.7")]
    VersionTooOld(String),

    #[error("Failed to detect git version: {0}")]
    VersionDetectFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Result type for git operations
pub type GitResult<T> = std::result::Result<T, GitError>;

//! Common types and utilities shared across daytext crates.
//!
//! This crate defines the shared error type and the observability helpers
//! used by the binary and the integration tests. It stays lightweight so
//! every crate can depend on it without pulling in the HTTP or HTML stack.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`DaytextError`] and [`Result`]: Shared error handling
//! - [`RunStatus`]: How a single run ended, mapped to an exit code
//!
//! # Examples
//!
//! ```rust
//! use daytext_common::{DaytextError, RunStatus};
//!
//! let err = DaytextError::SourceNotFound("daily".into());
//! assert_eq!(err.to_string(), "Source not found: daily");
//! assert_eq!(RunStatus::from_error(&err).exit_code(), 1);
//! ```

pub mod observability;

/// Error types used across the daytext workspace.
#[derive(thiserror::Error, Debug)]
pub enum DaytextError {
    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A source id named on the command line is not configured.
    #[error("Source not found: {0}")]
    SourceNotFound(String),

    /// The downloaded (or local) content could not be treated as a document.
    #[error("Malformed input: {0}")]
    Input(String),

    /// Every fetch attempt failed.
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// The run was interrupted before it finished.
    #[error("Cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenient alias for results that use [`DaytextError`].
pub type Result<T> = std::result::Result<T, DaytextError>;

/// Final state of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The page was fetched and queried (fields may still be absent).
    Completed,
    /// Fetching, parsing or configuration failed.
    Failed,
    /// Interrupted by the user.
    Cancelled,
}

impl RunStatus {
    pub fn from_error(err: &DaytextError) -> Self {
        match err {
            DaytextError::Cancelled => RunStatus::Cancelled,
            _ => RunStatus::Failed,
        }
    }

    /// Process exit code for this status.
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Completed => 0,
            RunStatus::Failed | RunStatus::Cancelled => 1,
        }
    }
}

//! Error types and exit codes for codenav-engine

use std::process::ExitCode;
use thiserror::Error;

/// Main error type for codenav-engine operations
#[derive(Error, Debug)]
pub enum CodeNavError {
    #[error("Root symbol not found: {target}")]
    RootNotFound { target: String },

    #[error("Project index unavailable: {message}")]
    IndexUnavailable { message: String },

    #[error("Invalid depth or budget: {message}")]
    InvalidDepthOrBudget { message: String },

    #[error("Overflow record not found: {id}")]
    OverflowRecordNotFound { id: String },

    /// Cooperative cancellation. A distinct outcome, not a tool error: handlers
    /// abort the call instead of emitting a response envelope for it.
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Failed to load index snapshot: {message}")]
    SnapshotFailure { message: String },

    #[error("Configuration error: {message}")]
    ConfigFailure { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodeNavError {
    /// Stable error code surfaced in response envelopes.
    ///
    /// Only the four contract kinds carry a code; cancellation and
    /// startup-time failures never reach an envelope.
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::RootNotFound { .. } => Some("RootNotFound"),
            Self::IndexUnavailable { .. } => Some("IndexUnavailable"),
            Self::InvalidDepthOrBudget { .. } => Some("InvalidDepthOrBudget"),
            Self::OverflowRecordNotFound { .. } => Some("OverflowRecordNotFound"),
            _ => None,
        }
    }

    /// Short recovery hints included alongside the error code.
    pub fn recovery_hints(&self) -> &'static [&'static str] {
        match self {
            Self::RootNotFound { .. } => &[
                "Check the symbol name or position",
                "Use resolve_symbol to inspect what the index sees at a position",
            ],
            Self::IndexUnavailable { .. } => &[
                "Verify the index snapshot path",
                "Regenerate the snapshot with your indexer and retry",
            ],
            Self::InvalidDepthOrBudget { .. } => &[
                "Depth must be at most 32; result and page counts must be positive",
            ],
            Self::OverflowRecordNotFound { .. } => &[
                "Overflow records expire; re-run the original query",
                "Page numbers are 1-based and bounded by the page count",
            ],
            _ => &[],
        }
    }

    /// Convert error to process exit code:
    /// - 0: Success
    /// - 1: IO / snapshot load failure
    /// - 2: Root symbol not found
    /// - 3: Index unavailable
    /// - 4: Invalid parameters / unknown overflow record
    /// - 5: Configuration error
    /// - 6: Cancelled
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Io(_) | Self::SnapshotFailure { .. } => ExitCode::from(1),
            Self::RootNotFound { .. } => ExitCode::from(2),
            Self::IndexUnavailable { .. } => ExitCode::from(3),
            Self::InvalidDepthOrBudget { .. } | Self::OverflowRecordNotFound { .. } => {
                ExitCode::from(4)
            }
            Self::ConfigFailure { .. } => ExitCode::from(5),
            Self::Cancelled => ExitCode::from(6),
        }
    }
}

/// Result type alias for codenav-engine operations
pub type Result<T> = std::result::Result<T, CodeNavError>;

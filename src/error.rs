//! Unified error handling for hipprobe
//!
//! Probes return [`HipError`] for "must succeed" runtime calls. This module
//! folds those together with configuration and worker failures into
//! one [`ProbeError`] for the suite and the CLI, and groups them by
//! [`ErrorCategory`]:
//! - Backend errors (HIP runtime failures)
//! - User errors (bad configuration, actionable by users)
//! - Internal errors (panicked workers)

use std::fmt;

use crate::config::ConfigError;
use crate::hip::HipError;

/// Unified error type for hipprobe
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    // ========== Backend Errors ==========
    /// A runtime call that must succeed did not
    #[error("HIP error: {0}")]
    Hip(#[from] HipError),

    // ========== User Errors ==========
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    // ========== Internal Errors ==========
    /// A per-device worker thread panicked
    #[error("Worker for device {device} panicked: {message}")]
    WorkerPanicked { device: i32, message: String },
}

impl ProbeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProbeError::Hip(_) => ErrorCategory::Backend,
            ProbeError::Config(_) => ErrorCategory::User,
            ProbeError::WorkerPanicked { .. } => ErrorCategory::Internal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    User,
    Internal,
    Backend,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::User => write!(f, "User"),
            ErrorCategory::Internal => write!(f, "Internal"),
            ErrorCategory::Backend => write!(f, "Backend"),
        }
    }
}

/// Helper type alias for Results using ProbeError
pub type ProbeResult<T> = std::result::Result<T, ProbeError>;

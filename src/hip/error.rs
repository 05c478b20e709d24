//! HIP error types

use thiserror::Error;

use super::status::HipStatus;

/// HIP error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HipError {
    #[error("HIP initialization failed: {0}")]
    InitializationFailed(HipStatus),
    #[error("Device not found")]
    DeviceNotFound,
    #[error("Invalid device: {0}")]
    InvalidDevice(HipStatus),
    #[error("Array allocation failed: {0}")]
    MemoryAllocationFailed(HipStatus),
    #[error("Array release failed: {0}")]
    MemoryFreeFailed(HipStatus),
    #[error("Memory query failed: {0}")]
    MemoryQueryFailed(HipStatus),
    #[error("Device error: {0}")]
    DeviceError(HipStatus),
    #[error("Runtime not available: {0}")]
    Unsupported(String),
    #[error("Internal lock poisoned - this indicates a bug: {0}")]
    LockPoisoned(String),
}

impl<T> From<std::sync::PoisonError<T>> for HipError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        HipError::LockPoisoned(format!("Lock poisoned: {}", err))
    }
}

/// HIP result type
pub type HipResult<T> = Result<T, HipError>;

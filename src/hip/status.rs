//! HIP status codes (`hipError_t`)

use std::fmt;

use serde::Serialize;

use super::error::{HipError, HipResult};

/// Raw status returned by a HIP runtime call
///
/// Kept as a newtype over the C enum value so unknown codes from newer
/// runtimes survive the round-trip instead of being collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct HipStatus(pub i32);

impl HipStatus {
    pub const SUCCESS: HipStatus = HipStatus(0);
    pub const INVALID_VALUE: HipStatus = HipStatus(1);
    pub const OUT_OF_MEMORY: HipStatus = HipStatus(2);
    pub const NOT_INITIALIZED: HipStatus = HipStatus(3);
    pub const NO_DEVICE: HipStatus = HipStatus(100);
    pub const INVALID_DEVICE: HipStatus = HipStatus(101);
    pub const INVALID_HANDLE: HipStatus = HipStatus(400);
    pub const NOT_SUPPORTED: HipStatus = HipStatus(801);
    pub const UNKNOWN: HipStatus = HipStatus(999);

    pub fn code(self) -> i32 {
        self.0
    }

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    /// Symbolic name as spelled in `hip_runtime_api.h`
    pub fn name(self) -> &'static str {
        match self.0 {
            0 => "hipSuccess",
            1 => "hipErrorInvalidValue",
            2 => "hipErrorOutOfMemory",
            3 => "hipErrorNotInitialized",
            100 => "hipErrorNoDevice",
            101 => "hipErrorInvalidDevice",
            400 => "hipErrorInvalidHandle",
            801 => "hipErrorNotSupported",
            999 => "hipErrorUnknown",
            _ => "hipErrorUnrecognized",
        }
    }

    /// Turn a "must succeed" status into a `HipResult`
    ///
    /// The error variant is chosen from `op`, so callers get
    /// `MemoryAllocationFailed` for allocations, `MemoryFreeFailed` for frees
    /// and so on.
    pub fn check(self, op: HipOp) -> HipResult<()> {
        if self.is_success() {
            return Ok(());
        }
        tracing::error!("{} failed with {} ({})", op.api_name(), self.name(), self.0);
        Err(op.into_error(self))
    }
}

impl fmt::Display for HipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}

impl From<i32> for HipStatus {
    fn from(code: i32) -> Self {
        HipStatus(code)
    }
}

/// Runtime entry points whose failure maps onto a `HipError`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HipOp {
    Init,
    GetDeviceCount,
    SetDevice,
    MemGetInfo,
    MallocArray,
    FreeArray,
}

impl HipOp {
    pub fn api_name(self) -> &'static str {
        match self {
            HipOp::Init => "hipInit",
            HipOp::GetDeviceCount => "hipGetDeviceCount",
            HipOp::SetDevice => "hipSetDevice",
            HipOp::MemGetInfo => "hipMemGetInfo",
            HipOp::MallocArray => "hipMallocArray",
            HipOp::FreeArray => "hipFreeArray",
        }
    }

    fn into_error(self, status: HipStatus) -> HipError {
        match self {
            HipOp::Init => HipError::InitializationFailed(status),
            HipOp::GetDeviceCount if status == HipStatus::NO_DEVICE => HipError::DeviceNotFound,
            HipOp::GetDeviceCount => HipError::DeviceError(status),
            HipOp::SetDevice => HipError::InvalidDevice(status),
            HipOp::MemGetInfo => HipError::MemoryQueryFailed(status),
            HipOp::MallocArray => HipError::MemoryAllocationFailed(status),
            HipOp::FreeArray => HipError::MemoryFreeFailed(status),
        }
    }
}

//! The runtime boundary the probes are written against
//!
//! [`ArrayRuntime`] mirrors the handful of HIP entry points the probes call.
//! Allocation and release return the raw [`HipStatus`] instead of a
//! `Result`: negative probes need to compare the exact outcome against an
//! oracle, while "must succeed" callers go through [`HipStatus::check`].

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::array::{ArrayFlags, ArrayHandle};
use super::channel::ChannelFormatDesc;
use super::error::{HipError, HipResult};
use super::memory::MemInfo;
use super::status::HipStatus;

/// Vendor backend underneath the HIP API
///
/// Some input-validation outcomes differ between the AMD and NVIDIA
/// implementations, so probes condition their oracles on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Amd,
    Nvidia,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Amd => write!(f, "amd"),
            Platform::Nvidia => write!(f, "nvidia"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "amd" | "rocm" | "hcc" => Ok(Platform::Amd),
            "nvidia" | "cuda" | "nvcc" => Ok(Platform::Nvidia),
            other => Err(format!("unknown platform '{}'", other)),
        }
    }
}

/// GPU runtime exposing array allocation
///
/// Device selection is per calling thread, as in HIP: `set_device` on one
/// thread does not affect allocations made from another.
pub trait ArrayRuntime: Send + Sync {
    /// Backend this runtime dispatches to
    fn platform(&self) -> Platform;

    /// Number of visible devices
    fn device_count(&self) -> HipResult<i32>;

    /// Make `device` current for the calling thread
    fn set_device(&self, device: i32) -> HipResult<()>;

    /// Snapshot of the calling thread's current device
    fn mem_get_info(&self) -> HipResult<MemInfo>;

    /// `hipMallocArray`
    ///
    /// `None` for `out` or `desc` passes a null pointer, which is how the
    /// null-argument contract is exercised.
    fn malloc_array(
        &self,
        out: Option<&mut ArrayHandle>,
        desc: Option<&ChannelFormatDesc>,
        width: usize,
        height: usize,
        flags: ArrayFlags,
    ) -> HipStatus;

    /// `hipFreeArray`
    fn free_array(&self, array: ArrayHandle) -> HipStatus;
}

/// Open the hardware runtime
///
/// Fails with [`HipError::Unsupported`] when the crate was built without the
/// `rocm` feature.
pub fn open_hip_runtime() -> HipResult<Box<dyn ArrayRuntime>> {
    #[cfg(feature = "rocm")]
    {
        let runtime = super::hip_runtime::HipRuntime::new_checked()?;
        Ok(Box::new(runtime))
    }
    #[cfg(not(feature = "rocm"))]
    {
        Err(HipError::Unsupported(
            "built without the `rocm` feature; rebuild with --features rocm".to_string(),
        ))
    }
}

/// Device indices `0..device_count()`
pub fn devices(runtime: &dyn ArrayRuntime) -> HipResult<Vec<i32>> {
    let count = runtime.device_count()?;
    if count <= 0 {
        return Err(HipError::DeviceNotFound);
    }
    Ok((0..count).collect())
}

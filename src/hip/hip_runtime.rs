//! `ArrayRuntime` backed by libamdhip64

use std::ffi::CStr;
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

use super::array::{ArrayFlags, ArrayHandle};
use super::channel::ChannelFormatDesc;
use super::error::{HipError, HipResult};
use super::ffi;
use super::memory::MemInfo;
use super::runtime::{ArrayRuntime, Platform};
use super::status::{HipOp, HipStatus};

/// Hardware runtime; holds no device state of its own
#[derive(Debug, Clone)]
pub struct HipRuntime {
    device_count: i32,
}

impl HipRuntime {
    /// Check if a GPU is reachable without failing loudly
    ///
    /// Returns false when `hipInit` fails or no device is visible. The probe
    /// runs once per process.
    pub fn gpu_available() -> bool {
        static AVAILABLE: AtomicBool = AtomicBool::new(false);
        static INIT: Once = Once::new();

        INIT.call_once(|| {
            let result = std::panic::catch_unwind(|| unsafe {
                let init_result = ffi::hipInit(0);
                if init_result != ffi::HIP_SUCCESS {
                    tracing::debug!("HIP not available: hipInit failed with code {}", init_result);
                    return false;
                }

                let mut count: i32 = 0;
                let count_result = ffi::hipGetDeviceCount(&mut count);
                if count_result != ffi::HIP_SUCCESS {
                    tracing::debug!(
                        "HIP not available: hipGetDeviceCount failed with code {}",
                        count_result
                    );
                    return false;
                }

                tracing::debug!("GPU available: {} ({} device(s))", count > 0, count);
                count > 0
            })
            .unwrap_or(false);

            AVAILABLE.store(result, Ordering::Release);
        });

        AVAILABLE.load(Ordering::Acquire)
    }

    /// Create the runtime only if a GPU is available
    pub fn new_checked() -> HipResult<Self> {
        if !Self::gpu_available() {
            return Err(HipError::DeviceNotFound);
        }
        Self::new()
    }

    pub fn new() -> HipResult<Self> {
        HipStatus(unsafe { ffi::hipInit(0) }).check(HipOp::Init)?;

        let mut count: i32 = 0;
        HipStatus(unsafe { ffi::hipGetDeviceCount(&mut count) }).check(HipOp::GetDeviceCount)?;
        if count <= 0 {
            return Err(HipError::DeviceNotFound);
        }

        tracing::info!("HipRuntime initialized with {} device(s)", count);
        Ok(HipRuntime {
            device_count: count,
        })
    }
}

impl ArrayRuntime for HipRuntime {
    fn platform(&self) -> Platform {
        Platform::Amd
    }

    fn device_count(&self) -> HipResult<i32> {
        let mut count: i32 = 0;
        HipStatus(unsafe { ffi::hipGetDeviceCount(&mut count) }).check(HipOp::GetDeviceCount)?;
        if count != self.device_count {
            tracing::warn!(
                "Device count changed since init: {} -> {}",
                self.device_count,
                count
            );
        }
        Ok(count)
    }

    fn set_device(&self, device: i32) -> HipResult<()> {
        tracing::trace!("hipSetDevice({})", device);
        HipStatus(unsafe { ffi::hipSetDevice(device) }).check(HipOp::SetDevice)
    }

    fn mem_get_info(&self) -> HipResult<MemInfo> {
        let mut free: usize = 0;
        let mut total: usize = 0;
        HipStatus(unsafe { ffi::hipMemGetInfo(&mut free, &mut total) })
            .check(HipOp::MemGetInfo)?;
        Ok(MemInfo::new(free, total))
    }

    fn malloc_array(
        &self,
        out: Option<&mut ArrayHandle>,
        desc: Option<&ChannelFormatDesc>,
        width: usize,
        height: usize,
        flags: ArrayFlags,
    ) -> HipStatus {
        let out_ptr = match out {
            Some(handle) => handle.as_out_ptr(),
            None => ptr::null_mut(),
        };
        let desc_ptr = desc.map_or(ptr::null(), |d| d as *const ChannelFormatDesc);

        // SAFETY: both pointers are either null or borrowed for the call
        let status = HipStatus(unsafe {
            ffi::hipMallocArray(out_ptr, desc_ptr, width, height, flags.bits())
        });
        tracing::trace!(
            "hipMallocArray({}x{}, flags={:#x}) -> {}",
            width,
            height,
            flags.bits(),
            status
        );
        if !status.is_success() {
            tracing::debug!("hipMallocArray: {}", get_error_string(status));
        }
        status
    }

    fn free_array(&self, array: ArrayHandle) -> HipStatus {
        let status = HipStatus(unsafe { ffi::hipFreeArray(array.as_ptr()) });
        tracing::trace!("hipFreeArray({:?}) -> {}", array, status);
        if !status.is_success() {
            tracing::debug!("hipFreeArray: {}", get_error_string(status));
        }
        status
    }
}

/// Get HIP error string from error code
pub fn get_error_string(status: HipStatus) -> String {
    unsafe {
        let error_ptr = ffi::hipGetErrorString(status.code());
        if error_ptr.is_null() {
            "Unknown error".to_string()
        } else {
            CStr::from_ptr(error_ptr).to_string_lossy().into_owned()
        }
    }
}

//! Array handles, allocation flags and the RAII array wrapper

use std::ffi::c_void;
use std::fmt;
use std::ptr;

use serde::Serialize;

use super::channel::ChannelFormatDesc;
use super::error::HipResult;
use super::runtime::ArrayRuntime;
use super::status::HipOp;

/// Flags accepted by `hipMallocArray`
///
/// Stored as the raw `unsigned int` so that undefined bit patterns can be
/// passed through to the runtime unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ArrayFlags(pub u32);

impl ArrayFlags {
    pub const DEFAULT: ArrayFlags = ArrayFlags(0x00);
    pub const LAYERED: ArrayFlags = ArrayFlags(0x01);
    pub const SURFACE_LOAD_STORE: ArrayFlags = ArrayFlags(0x02);
    pub const CUBEMAP: ArrayFlags = ArrayFlags(0x04);
    pub const TEXTURE_GATHER: ArrayFlags = ArrayFlags(0x08);

    const KNOWN_BITS: u32 = 0x0f;

    pub const fn from_bits(bits: u32) -> Self {
        ArrayFlags(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True when every set bit is a documented flag
    pub const fn is_defined(self) -> bool {
        self.0 & !Self::KNOWN_BITS == 0
    }

    /// Flags that `hipMallocArray` accepts for 2D arrays
    ///
    /// Layered and cubemap arrays need the 3D entry point.
    pub const fn is_valid_for_2d(self) -> bool {
        self.is_defined() && self.0 & (Self::LAYERED.0 | Self::CUBEMAP.0) == 0
    }
}

impl Default for ArrayFlags {
    fn default() -> Self {
        ArrayFlags::DEFAULT
    }
}

impl std::ops::BitOr for ArrayFlags {
    type Output = ArrayFlags;

    fn bitor(self, rhs: ArrayFlags) -> ArrayFlags {
        ArrayFlags(self.0 | rhs.0)
    }
}

// SAFETY: the handle is an opaque token owned by the runtime; the HIP
// runtime allows it to be freed from any host thread.
unsafe impl Send for ArrayHandle {}
unsafe impl Sync for ArrayHandle {}

/// Opaque `hipArray_t`
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayHandle(*mut c_void);

impl ArrayHandle {
    pub const fn null() -> Self {
        ArrayHandle(ptr::null_mut())
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.0
    }

    /// Wrap a raw pointer written by the runtime
    pub fn from_raw(ptr: *mut c_void) -> Self {
        ArrayHandle(ptr)
    }

    /// Mutable out-parameter slot for FFI calls
    pub(crate) fn as_out_ptr(&mut self) -> *mut *mut c_void {
        &mut self.0
    }
}

impl Default for ArrayHandle {
    fn default() -> Self {
        ArrayHandle::null()
    }
}

impl fmt::Debug for ArrayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArrayHandle({:p})", self.0)
    }
}

/// Width and height of a 2D array, in elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ArrayExtent {
    pub width: usize,
    pub height: usize,
}

impl ArrayExtent {
    pub const fn new(width: usize, height: usize) -> Self {
        ArrayExtent { width, height }
    }
}

impl fmt::Display for ArrayExtent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Array owned by the caller until [`DeviceArray::free`] or drop
///
/// `free` reports the release status; dropping an unreleased array frees it
/// and only logs a failure.
pub struct DeviceArray<'rt> {
    runtime: &'rt dyn ArrayRuntime,
    handle: ArrayHandle,
    extent: ArrayExtent,
    released: bool,
}

impl<'rt> DeviceArray<'rt> {
    /// Allocate an array on the runtime's current device
    pub fn new(
        runtime: &'rt dyn ArrayRuntime,
        desc: &ChannelFormatDesc,
        extent: ArrayExtent,
        flags: ArrayFlags,
    ) -> HipResult<Self> {
        let mut handle = ArrayHandle::null();
        runtime
            .malloc_array(Some(&mut handle), Some(desc), extent.width, extent.height, flags)
            .check(HipOp::MallocArray)?;
        tracing::debug!("DeviceArray::new: allocated {} array at {:?}", extent, handle);
        Ok(DeviceArray {
            runtime,
            handle,
            extent,
            released: false,
        })
    }

    pub fn handle(&self) -> ArrayHandle {
        self.handle
    }

    pub fn extent(&self) -> ArrayExtent {
        self.extent
    }

    /// Release the array, surfacing the runtime's status
    pub fn free(mut self) -> HipResult<()> {
        self.released = true;
        self.runtime
            .free_array(self.handle)
            .check(HipOp::FreeArray)
    }
}

impl Drop for DeviceArray<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let status = self.runtime.free_array(self.handle);
        if !status.is_success() {
            tracing::warn!(
                "DeviceArray::drop: hipFreeArray({:?}) returned {}",
                self.handle,
                status
            );
        }
    }
}

impl fmt::Debug for DeviceArray<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceArray")
            .field("handle", &self.handle)
            .field("extent", &self.extent)
            .field("released", &self.released)
            .finish()
    }
}

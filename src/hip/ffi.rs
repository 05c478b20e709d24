//! HIP FFI bindings
//!
//! Only the entry points the array probes need are declared. They are
//! called exclusively through `HipRuntime`, which converts raw codes into
//! `HipStatus`.

use std::ffi::{c_char, c_uint, c_void};

use super::channel::ChannelFormatDesc;

#[link(name = "amdhip64")]
extern "C" {
    pub fn hipInit(flags: c_uint) -> i32;
    pub fn hipGetDeviceCount(count: *mut i32) -> i32;
    pub fn hipSetDevice(deviceId: i32) -> i32;
    pub fn hipMemGetInfo(free: *mut usize, total: *mut usize) -> i32;
    pub fn hipMallocArray(
        array: *mut *mut c_void,
        desc: *const ChannelFormatDesc,
        width: usize,
        height: usize,
        flags: c_uint,
    ) -> i32;
    pub fn hipFreeArray(array: *mut c_void) -> i32;
    pub fn hipGetErrorString(error: i32) -> *const c_char;
}

/// HIP success code
pub const HIP_SUCCESS: i32 = 0;

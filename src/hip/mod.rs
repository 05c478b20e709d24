//! HIP array allocation API
//!
//! Wraps `hipMallocArray` / `hipFreeArray` and the device and memory queries
//! around them behind the [`ArrayRuntime`] trait. `HipRuntime` talks to
//! libamdhip64 (feature `rocm`); [`DummyRuntime`] is a host-only stand-in.

pub mod array;
pub mod channel;
pub mod dummy_runtime;
pub mod error;
#[cfg(feature = "rocm")]
pub mod ffi;
#[cfg(feature = "rocm")]
pub mod hip_runtime;
pub mod memory;
pub mod runtime;
pub mod status;

pub use array::{ArrayExtent, ArrayFlags, ArrayHandle, DeviceArray};
pub use channel::{create_channel_desc, ChannelElement, ChannelFormatDesc, ChannelFormatKind};
pub use dummy_runtime::{DummyConfig, DummyRuntime, DummyRuntimeStats};
pub use error::{HipError, HipResult};
#[cfg(feature = "rocm")]
pub use hip_runtime::{get_error_string, HipRuntime};
pub use memory::MemInfo;
pub use runtime::{devices, open_hip_runtime, ArrayRuntime, Platform};
pub use status::{HipOp, HipStatus};

//! Common test utilities for array probe tests
//!
//! - `GPU_FIXTURE` (feature `rocm`): one shared HIP runtime, `None` when no
//!   GPU is visible so hardware tests skip gracefully
//! - dummy runtime constructors for host-only tests
//!
//! # Usage
//!
//! ```ignore
//! #[test]
//! #[serial]
//! fn my_gpu_test() {
//!     let Some(fixture) = GPU_FIXTURE.as_ref() else {
//!         return;
//!     };
//!     let runtime = fixture.runtime();
//!     // ... probe code ...
//!     fixture.assert_no_leak();
//! }
//! ```

#![allow(dead_code)]

use hipprobe::hip::{DummyConfig, DummyRuntime, Platform};

#[cfg(feature = "rocm")]
pub use gpu::{GpuTestFixture, GPU_FIXTURE};

/// Dummy runtime with `devices` devices and default limits
pub fn dummy_runtime(devices: i32) -> DummyRuntime {
    DummyRuntime::new(devices)
}

/// Dummy runtime that reports the NVIDIA platform
pub fn nvidia_dummy_runtime(devices: i32) -> DummyRuntime {
    DummyRuntime::new(devices).with_platform(Platform::Nvidia)
}

/// Dummy runtime with only `bytes` of memory per device
pub fn tight_dummy_runtime(devices: i32, bytes: usize) -> DummyRuntime {
    DummyRuntime::with_config(DummyConfig {
        device_count: devices,
        capacity_per_device: bytes,
        ..DummyConfig::default()
    })
}

#[cfg(feature = "rocm")]
mod gpu {
    use hipprobe::hip::{ArrayRuntime, HipResult, HipRuntime, MemInfo};
    use once_cell::sync::Lazy;

    /// Global GPU test fixture
    ///
    /// Initialized once and shared by every test in the binary. `None` when
    /// HIP is not installed or no device is visible.
    pub static GPU_FIXTURE: Lazy<Option<GpuTestFixture>> = Lazy::new(|| {
        if !HipRuntime::gpu_available() {
            eprintln!("WARNING: GPU not available - skipping hipMallocArray hardware tests");
            eprintln!("To enable them, ensure:");
            eprintln!("  1. An AMD GPU is present");
            eprintln!("  2. ROCm is installed (check with rocm-smi)");
            eprintln!("  3. amdhip64 is in LD_LIBRARY_PATH");
            return None;
        }

        match GpuTestFixture::new() {
            Ok(fixture) => {
                eprintln!("GPU test fixture initialized");
                eprintln!("   Devices: {}", fixture.device_count());
                eprintln!(
                    "   Device 0: {} MB of {} MB free",
                    fixture.initial().available_mb(),
                    fixture.initial().total_mb()
                );
                Some(fixture)
            }
            Err(e) => {
                eprintln!("ERROR: failed to initialize GPU test fixture: {}", e);
                None
            }
        }
    });

    pub struct GpuTestFixture {
        runtime: HipRuntime,
        device_count: i32,
        initial: MemInfo,
    }

    impl GpuTestFixture {
        pub fn new() -> HipResult<Self> {
            let runtime = HipRuntime::new_checked()?;
            let device_count = runtime.device_count()?;
            runtime.set_device(0)?;
            let initial = runtime.mem_get_info()?;
            Ok(Self {
                runtime,
                device_count,
                initial,
            })
        }

        pub fn runtime(&self) -> &HipRuntime {
            &self.runtime
        }

        pub fn device_count(&self) -> i32 {
            self.device_count
        }

        /// Device 0 snapshot taken when the fixture was created
        pub fn initial(&self) -> MemInfo {
            self.initial
        }

        /// Panics if device 0 has less memory available than at fixture creation
        pub fn assert_no_leak(&self) {
            self.runtime.set_device(0).expect("Failed to select device 0");
            let now = self
                .runtime
                .mem_get_info()
                .expect("Failed to query GPU memory");
            let leaked = self.initial.leaked_since(&now);
            assert_eq!(
                leaked, 0,
                "GPU memory leak detected: {} bytes (initial {}, now {})",
                leaked, self.initial, now
            );
        }
    }
}

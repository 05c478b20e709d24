//! Host-only runtime for exercising the probes without a GPU
//!
//! `DummyRuntime` keeps per-device byte accounting and applies the same
//! input validation the HIP array allocator documents. No device memory is
//! touched; handles are fake pointers (starting at 16, like llama.cpp's
//! dummy backend) that only this runtime can resolve.
//!
//! Leak injection (`with_leak_per_free`) makes every release keep back a few
//! bytes, so the leak detection in the probes can itself be tested.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, ThreadId};

use super::array::{ArrayFlags, ArrayHandle};
use super::channel::ChannelFormatDesc;
use super::error::{HipError, HipResult};
use super::memory::MemInfo;
use super::runtime::{ArrayRuntime, Platform};
use super::status::HipStatus;

/// Default capacity of each fake device
pub const DEFAULT_DEVICE_CAPACITY: usize = 1 << 30;

/// Allocation granularity; footprints are rounded up to this
pub const DEFAULT_GRANULARITY: usize = 4096;

/// Largest width or height accepted (maxTexture2D on current AMD parts)
pub const DEFAULT_MAX_EXTENT: usize = 16384;

const FAKE_BASE: usize = 16;

/// Tunables for [`DummyRuntime`]
#[derive(Debug, Clone)]
pub struct DummyConfig {
    pub device_count: i32,
    pub capacity_per_device: usize,
    pub granularity: usize,
    pub max_extent: usize,
    pub platform: Platform,
    /// Bytes withheld from the device on every free
    pub leak_per_free: usize,
}

impl Default for DummyConfig {
    fn default() -> Self {
        DummyConfig {
            device_count: 1,
            capacity_per_device: DEFAULT_DEVICE_CAPACITY,
            granularity: DEFAULT_GRANULARITY,
            max_extent: DEFAULT_MAX_EXTENT,
            platform: Platform::Amd,
            leak_per_free: 0,
        }
    }
}

/// Counters for tests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DummyRuntimeStats {
    pub allocations: usize,
    pub frees: usize,
    pub rejected_allocations: usize,
    pub rejected_frees: usize,
}

#[derive(Debug)]
struct DummyArray {
    device: i32,
    bytes: usize,
}

#[derive(Debug)]
struct DummyState {
    available: Vec<usize>,
    arrays: HashMap<usize, DummyArray>,
    current: HashMap<ThreadId, i32>,
    stats: DummyRuntimeStats,
}

/// Drops a thread's device selection when that thread exits
struct DeviceSelectionGuard {
    state: Weak<Mutex<DummyState>>,
    thread: ThreadId,
}

impl Drop for DeviceSelectionGuard {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            if let Ok(mut state) = state.lock() {
                state.current.remove(&self.thread);
            }
        }
    }
}

thread_local! {
    static DEVICE_SELECTIONS: RefCell<Vec<DeviceSelectionGuard>> =
        const { RefCell::new(Vec::new()) };
}

/// Accounting-only runtime
#[derive(Debug)]
pub struct DummyRuntime {
    config: DummyConfig,
    state: Arc<Mutex<DummyState>>,
    next_offset: AtomicUsize,
}

impl DummyRuntime {
    /// Runtime with `device_count` devices and default limits
    pub fn new(device_count: i32) -> Self {
        Self::with_config(DummyConfig {
            device_count,
            ..DummyConfig::default()
        })
    }

    pub fn with_config(config: DummyConfig) -> Self {
        let devices = config.device_count.max(0) as usize;
        DummyRuntime {
            state: Arc::new(Mutex::new(DummyState {
                available: vec![config.capacity_per_device; devices],
                arrays: HashMap::new(),
                current: HashMap::new(),
                stats: DummyRuntimeStats::default(),
            })),
            config,
            next_offset: AtomicUsize::new(0),
        }
    }

    /// Withhold `bytes` from the device on every successful free
    pub fn with_leak_per_free(mut self, bytes: usize) -> Self {
        self.config.leak_per_free = bytes;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.config.platform = platform;
        self
    }

    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Arrays allocated and not yet freed, across all devices
    pub fn live_arrays(&self) -> usize {
        self.state.lock().map(|s| s.arrays.len()).unwrap_or(0)
    }

    /// Threads whose device selection is currently held
    ///
    /// A selection lives until its thread exits.
    pub fn tracked_threads(&self) -> usize {
        self.state.lock().map(|s| s.current.len()).unwrap_or(0)
    }

    pub fn stats(&self) -> DummyRuntimeStats {
        self.state
            .lock()
            .map(|s| s.stats.clone())
            .unwrap_or_default()
    }

    /// Bytes charged for an allocation, or the status the runtime would return
    fn footprint(
        &self,
        desc: &ChannelFormatDesc,
        width: usize,
        height: usize,
    ) -> Result<usize, HipStatus> {
        let element_bytes = desc.element_bytes().ok_or(HipStatus::INVALID_VALUE)?;
        if width > self.config.max_extent || height > self.config.max_extent {
            return Err(HipStatus::INVALID_VALUE);
        }
        // Height 0 allocates a 1D array of `width` elements
        let rows = height.max(1);
        let raw = width
            .checked_mul(rows)
            .and_then(|n| n.checked_mul(element_bytes))
            .ok_or(HipStatus::OUT_OF_MEMORY)?;
        let granularity = self.config.granularity.max(1);
        raw.checked_add(granularity - 1)
            .map(|n| n / granularity * granularity)
            .ok_or(HipStatus::OUT_OF_MEMORY)
    }

    fn current_device(state: &DummyState) -> i32 {
        state
            .current
            .get(&thread::current().id())
            .copied()
            .unwrap_or(0)
    }
}

impl ArrayRuntime for DummyRuntime {
    fn platform(&self) -> Platform {
        self.config.platform
    }

    fn device_count(&self) -> HipResult<i32> {
        Ok(self.config.device_count.max(0))
    }

    fn set_device(&self, device: i32) -> HipResult<()> {
        if device < 0 || device >= self.config.device_count {
            return Err(HipError::InvalidDevice(HipStatus::INVALID_DEVICE));
        }
        let thread = thread::current().id();
        let first_selection = self.state.lock()?.current.insert(thread, device).is_none();
        if first_selection {
            let guard = DeviceSelectionGuard {
                state: Arc::downgrade(&self.state),
                thread,
            };
            DEVICE_SELECTIONS.with(|guards| {
                let mut guards = guards.borrow_mut();
                guards.retain(|g| g.state.strong_count() > 0);
                guards.push(guard);
            });
        }
        Ok(())
    }

    fn mem_get_info(&self) -> HipResult<MemInfo> {
        let state = self.state.lock()?;
        let device = Self::current_device(&state);
        let available = state
            .available
            .get(device as usize)
            .copied()
            .ok_or(HipError::DeviceNotFound)?;
        Ok(MemInfo::new(available, self.config.capacity_per_device))
    }

    fn malloc_array(
        &self,
        out: Option<&mut ArrayHandle>,
        desc: Option<&ChannelFormatDesc>,
        width: usize,
        height: usize,
        flags: ArrayFlags,
    ) -> HipStatus {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(_) => return HipStatus::UNKNOWN,
        };

        let checked = match (out, desc) {
            (Some(out), Some(desc))
                if desc.is_well_formed() && width != 0 && flags.is_valid_for_2d() =>
            {
                self.footprint(desc, width, height).map(|bytes| (out, bytes))
            }
            _ => Err(HipStatus::INVALID_VALUE),
        };

        let (out, bytes) = match checked {
            Ok(ok) => ok,
            Err(status) => {
                state.stats.rejected_allocations += 1;
                tracing::debug!(
                    "DummyRuntime: rejected {}x{} flags={:#x}: {}",
                    width,
                    height,
                    flags.bits(),
                    status
                );
                return status;
            }
        };

        let device = Self::current_device(&state);
        let index = device as usize;
        match state.available.get(index) {
            Some(&available) if bytes <= available => state.available[index] -= bytes,
            Some(_) => {
                state.stats.rejected_allocations += 1;
                return HipStatus::OUT_OF_MEMORY;
            }
            None => {
                state.stats.rejected_allocations += 1;
                return HipStatus::INVALID_DEVICE;
            }
        }

        let offset = self.next_offset.fetch_add(FAKE_BASE, Ordering::Relaxed);
        let key = FAKE_BASE + offset;
        state.arrays.insert(key, DummyArray { device, bytes });
        state.stats.allocations += 1;

        *out = ArrayHandle::from_raw(key as *mut c_void);
        HipStatus::SUCCESS
    }

    fn free_array(&self, array: ArrayHandle) -> HipStatus {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(_) => return HipStatus::UNKNOWN,
        };

        let Some(entry) = state.arrays.remove(&(array.as_ptr() as usize)) else {
            state.stats.rejected_frees += 1;
            return if array.is_null() {
                HipStatus::INVALID_VALUE
            } else {
                HipStatus::INVALID_HANDLE
            };
        };

        let returned = entry.bytes.saturating_sub(self.config.leak_per_free);
        if let Some(available) = state.available.get_mut(entry.device as usize) {
            *available += returned;
        }
        state.stats.frees += 1;
        HipStatus::SUCCESS
    }
}

//! Device memory snapshots (`hipMemGetInfo`)

use std::fmt;

use serde::Serialize;

/// Available/total bytes of the current device at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MemInfo {
    pub available: usize,
    pub total: usize,
}

impl MemInfo {
    pub const fn new(available: usize, total: usize) -> Self {
        MemInfo { available, total }
    }

    pub fn used(&self) -> usize {
        self.total.saturating_sub(self.available)
    }

    /// Bytes that disappeared between `self` and a later snapshot
    ///
    /// Zero when the later snapshot has at least as much available memory.
    pub fn leaked_since(&self, later: &MemInfo) -> usize {
        self.available.saturating_sub(later.available)
    }

    pub fn available_mb(&self) -> usize {
        self.available / 1024 / 1024
    }

    pub fn total_mb(&self) -> usize {
        self.total / 1024 / 1024
    }
}

impl fmt::Display for MemInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} bytes available", self.available, self.total)
    }
}

//! hipprobe - hipMallocArray conformance probes for AMD GPUs
//!
//! Checks that a HIP runtime honors the documented contract of
//! `hipMallocArray` / `hipFreeArray`: input validation, allocation across
//! element types, memory accounting returning to baseline after
//! allocate/free cycles, and the same under concurrent multi-device use.
//!
//! The probes are written against [`hip::ArrayRuntime`]. Build with the
//! `rocm` feature to run them on hardware through libamdhip64;
//! [`hip::DummyRuntime`] runs them on the host.

#![allow(clippy::missing_safety_doc)] // FFI bindings documented at module level

pub mod config;
pub mod error;
pub mod hip;
pub mod logging;
pub mod probe;

pub use config::{ConfigError, ProbeConfig};
pub use error::{ErrorCategory, ProbeError, ProbeResult};
pub use hip::{ArrayRuntime, DummyRuntime, HipError, HipResult, HipStatus};
pub use probe::{run_suite, CaseOutcome, ProbeReport, SuiteReport, Verdict};

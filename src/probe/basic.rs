//! Basic probe: a small array allocates and frees for each element type

use crate::config::ProbeConfig;
use crate::hip::{
    ArrayFlags, ArrayHandle, ArrayRuntime, ChannelElement, ChannelFormatDesc, HipOp, HipResult,
};

use super::{CaseOutcome, ProbeReport};

/// Allocate `config.basic_extent` arrays of `i32`, `u32` and `f32`
pub fn run_basic(runtime: &dyn ArrayRuntime, config: &ProbeConfig) -> HipResult<ProbeReport> {
    let mut report = ProbeReport::new("basic");
    report.push(basic_case::<i32>(runtime, "int", config)?);
    report.push(basic_case::<u32>(runtime, "unsigned int", config)?);
    report.push(basic_case::<f32>(runtime, "float", config)?);
    Ok(report)
}

/// Allocation must succeed (recorded); the following free must succeed (fatal)
pub fn basic_case<T: ChannelElement>(
    runtime: &dyn ArrayRuntime,
    type_name: &str,
    config: &ProbeConfig,
) -> HipResult<CaseOutcome> {
    let desc = ChannelFormatDesc::of::<T>();
    let extent = config.basic_extent;
    let mut handle = ArrayHandle::null();

    let status = runtime.malloc_array(
        Some(&mut handle),
        Some(&desc),
        extent.width,
        extent.height,
        ArrayFlags::DEFAULT,
    );
    if status.is_success() {
        runtime.free_array(handle).check(HipOp::FreeArray)?;
    }

    Ok(CaseOutcome::check(
        type_name,
        status.is_success(),
        format!("{} array of {:?}: {}", extent, desc.f, status),
    ))
}

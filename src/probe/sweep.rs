//! Size-sweep probe: allocate many arrays per geometry, free them, and
//! check that the device's available memory returns to its baseline.

use crate::config::ProbeConfig;
use crate::hip::{ArrayFlags, ArrayRuntime, ChannelFormatDesc, DeviceArray, HipResult};

use super::{CaseOutcome, ProbeReport};

/// Run the size sweep on `device`
///
/// For every configured geometry: select `device`, snapshot, allocate
/// `config.array_count` float arrays with default flags, free all of them,
/// snapshot again. A snapshot mismatch is recorded as a failed case; any
/// runtime call that does not succeed aborts with `Err`. Arrays allocated
/// before an abort are released on the way out.
pub fn run_size_sweep(
    runtime: &dyn ArrayRuntime,
    device: i32,
    config: &ProbeConfig,
) -> HipResult<ProbeReport> {
    let span = tracing::debug_span!("size_sweep", device);
    let _enter = span.enter();

    let mut report = ProbeReport::new(format!("size_sweep[device {}]", device));
    let desc = ChannelFormatDesc::of::<f32>();

    for &extent in &config.geometries {
        runtime.set_device(device)?;
        let before = runtime.mem_get_info()?;

        // Grown on demand: the count is not trusted to fit in memory
        let mut arrays = Vec::new();
        for _ in 0..config.array_count {
            arrays.push(DeviceArray::new(runtime, &desc, extent, ArrayFlags::DEFAULT)?);
        }
        tracing::debug!(
            "Allocated {} arrays of {} on device {}",
            arrays.len(),
            extent,
            device
        );

        for array in arrays {
            array.free()?;
        }

        let after = runtime.mem_get_info()?;
        let name = format!("device {} {} x{}", device, extent, config.array_count);
        if before.available == after.available {
            report.push(CaseOutcome::passed(
                name,
                format!("available memory unchanged at {} bytes", after.available),
            ));
        } else {
            report.push(CaseOutcome::failed(
                name,
                format!(
                    "available memory {} -> {} ({} bytes not returned)",
                    before.available,
                    after.available,
                    before.leaked_since(&after)
                ),
            ));
        }
    }

    Ok(report)
}

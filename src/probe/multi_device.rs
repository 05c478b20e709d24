//! Multi-device probe: run the size sweep on every device at once
//!
//! One OS thread per device runs [`run_size_sweep`] pinned to its device.
//! The calling thread snapshots its current device before spawning and
//! after joining; a difference means some allocation was never returned.

use std::thread;

use crate::config::ProbeConfig;
use crate::error::{ProbeError, ProbeResult};
use crate::hip::{devices, ArrayRuntime};

use super::{run_size_sweep, CaseOutcome, ProbeReport};

/// Spawn one size-sweep worker per device and check global accounting
///
/// A worker that errors or panics fails the whole probe. Per-device sweep
/// outcomes are merged into the returned report, followed by the global
/// snapshot check.
pub fn run_multi_device(
    runtime: &dyn ArrayRuntime,
    config: &ProbeConfig,
) -> ProbeResult<ProbeReport> {
    let device_ids = devices(runtime)?;
    let before = runtime.mem_get_info()?;
    tracing::info!("Starting size sweep on {} device(s)", device_ids.len());

    let results: Vec<(i32, thread::Result<_>)> = thread::scope(|scope| {
        let handles: Vec<_> = device_ids
            .iter()
            .map(|&device| {
                let handle = thread::Builder::new()
                    .name(format!("hipprobe-dev{}", device))
                    .spawn_scoped(scope, move || run_size_sweep(runtime, device, config));
                (device, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(device, handle)| match handle {
                Ok(handle) => (device, handle.join()),
                Err(spawn_error) => {
                    let payload: Box<dyn std::any::Any + Send> =
                        Box::new(format!("spawn failed: {}", spawn_error));
                    (device, Err(payload))
                }
            })
            .collect()
    });

    let mut report = ProbeReport::new("multi_device");
    for (device, result) in results {
        match result {
            Ok(Ok(sweep)) => report.outcomes.extend(sweep.outcomes),
            Ok(Err(hip_error)) => {
                tracing::error!("Size sweep on device {} aborted: {}", device, hip_error);
                return Err(ProbeError::Hip(hip_error));
            }
            Err(payload) => {
                return Err(ProbeError::WorkerPanicked {
                    device,
                    message: panic_message(payload.as_ref()),
                })
            }
        }
    }

    let after = runtime.mem_get_info()?;
    if before.available == after.available {
        report.push(CaseOutcome::passed(
            "global snapshot",
            format!("available memory unchanged at {} bytes", after.available),
        ));
    } else {
        tracing::warn!(
            "Memory leak of hipMallocArray API in multithreaded scenario: {} bytes",
            before.leaked_since(&after)
        );
        report.push(CaseOutcome::failed(
            "global snapshot",
            format!(
                "available memory {} -> {} after {} worker(s)",
                before.available,
                after.available,
                device_ids.len()
            ),
        ));
    }

    Ok(report)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

//! Run every probe and collect one report

use serde::Serialize;

use crate::config::ProbeConfig;
use crate::error::{ProbeError, ProbeResult};
use crate::hip::ArrayRuntime;

use super::{run_basic, run_multi_device, run_negative, run_size_sweep, CaseOutcome, ProbeReport};

/// Reports of a whole suite run, in execution order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteReport {
    pub platform: String,
    pub reports: Vec<ProbeReport>,
}

impl SuiteReport {
    pub fn passed(&self) -> bool {
        self.reports.iter().all(ProbeReport::passed)
    }

    pub fn failure_count(&self) -> usize {
        self.reports.iter().map(|r| r.failures().len()).sum()
    }

    pub fn report(&self, probe: &str) -> Option<&ProbeReport> {
        self.reports.iter().find(|r| r.probe == probe)
    }
}

/// Negative, basic, single-device sweep (device 0) and multi-device probes
///
/// A probe that aborts is recorded as a single failed `aborted` case so the
/// remaining probes still run. Only an invalid configuration stops the suite
/// before it starts.
pub fn run_suite(runtime: &dyn ArrayRuntime, config: &ProbeConfig) -> ProbeResult<SuiteReport> {
    config.validate()?;
    let platform = config.platform.unwrap_or_else(|| runtime.platform());
    tracing::info!("Running hipMallocArray suite on {} platform", platform);

    let reports = vec![
        settle("negative", run_negative(runtime, config).map_err(ProbeError::from)),
        settle("basic", run_basic(runtime, config).map_err(ProbeError::from)),
        settle(
            "size_sweep[device 0]",
            run_size_sweep(runtime, 0, config).map_err(ProbeError::from),
        ),
        settle("multi_device", run_multi_device(runtime, config)),
    ];

    Ok(SuiteReport {
        platform: platform.to_string(),
        reports,
    })
}

fn settle(probe: &str, result: ProbeResult<ProbeReport>) -> ProbeReport {
    result.unwrap_or_else(|err| {
        tracing::error!("Probe {} aborted: {}", probe, err);
        let mut report = ProbeReport::new(probe);
        report.push(CaseOutcome::failed("aborted", err.to_string()));
        report
    })
}

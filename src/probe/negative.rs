//! Negative-input probe: `hipMallocArray` must reject malformed requests
//!
//! Every case encodes its expected outcome directly. Note the asymmetry
//! between zero width (rejected) and zero height (accepted as a 1D array);
//! it is what current runtimes do and is kept as observed.

use crate::config::ProbeConfig;
use crate::hip::{
    ArrayFlags, ArrayHandle, ArrayRuntime, ChannelFormatDesc, HipOp, HipResult, HipStatus,
    Platform,
};

use super::{CaseOutcome, Expectation, ProbeReport};

/// One malformed (or borderline) allocation request and its oracle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegativeCase {
    pub name: &'static str,
    /// Pass a null output-handle pointer
    pub null_output: bool,
    /// Pass a null format-descriptor pointer
    pub null_desc: bool,
    pub width: usize,
    pub height: usize,
    pub flags: ArrayFlags,
    pub expect: Expectation,
    /// Only meaningful on this platform; skipped elsewhere
    pub only_on: Option<Platform>,
}

impl NegativeCase {
    fn new(name: &'static str, width: usize, height: usize, expect: Expectation) -> Self {
        NegativeCase {
            name,
            null_output: false,
            null_desc: false,
            width,
            height,
            flags: ArrayFlags::DEFAULT,
            expect,
            only_on: None,
        }
    }

    pub fn applies_to(&self, platform: Platform) -> bool {
        self.only_on.map_or(true, |only| only == platform)
    }
}

/// The fixed negative cases for `config`
pub fn negative_cases(config: &ProbeConfig) -> Vec<NegativeCase> {
    let w = config.basic_extent.width;
    let h = config.basic_extent.height;
    let max = i32::MAX as usize;

    vec![
        NegativeCase {
            null_output: true,
            only_on: Some(Platform::Nvidia),
            ..NegativeCase::new("null array pointer", w, h, Expectation::Fails)
        },
        NegativeCase {
            null_desc: true,
            only_on: Some(Platform::Nvidia),
            ..NegativeCase::new("null channel descriptor", w, h, Expectation::Fails)
        },
        NegativeCase::new("zero width", 0, h, Expectation::Fails),
        NegativeCase::new("zero height", w, 0, Expectation::Succeeds),
        NegativeCase {
            flags: config.invalid_flag,
            ..NegativeCase::new("invalid flag", w, h, Expectation::Fails)
        },
        NegativeCase::new("max int extents", max, max, Expectation::Fails),
    ]
}

/// Run every negative case against `runtime`
///
/// Arrays that a case manages to allocate are freed again; a failing free
/// aborts the probe.
pub fn run_negative(runtime: &dyn ArrayRuntime, config: &ProbeConfig) -> HipResult<ProbeReport> {
    let platform = config.platform.unwrap_or_else(|| runtime.platform());
    let desc = ChannelFormatDesc::of::<f32>();
    let mut report = ProbeReport::new("negative");

    for case in negative_cases(config) {
        if !case.applies_to(platform) {
            report.push(CaseOutcome::skipped(
                case.name,
                format!("only checked on {}", case.only_on.unwrap_or(platform)),
            ));
            continue;
        }

        let mut handle = ArrayHandle::null();
        let status = runtime.malloc_array(
            (!case.null_output).then_some(&mut handle),
            (!case.null_desc).then_some(&desc),
            case.width,
            case.height,
            case.flags,
        );

        if status.is_success() && !handle.is_null() {
            runtime.free_array(handle).check(HipOp::FreeArray)?;
        }

        report.push(CaseOutcome::check(
            case.name,
            case.expect.matches(status),
            describe(&case, status),
        ));
    }

    Ok(report)
}

fn describe(case: &NegativeCase, status: HipStatus) -> String {
    format!(
        "{}x{} flags={:#x} expected {}, got {}",
        case.width,
        case.height,
        case.flags.bits(),
        case.expect,
        status
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hip::DummyRuntime;
    use crate::probe::Verdict;

    #[test]
    fn test_case_table() {
        let cases = negative_cases(&ProbeConfig::default());
        assert_eq!(cases.len(), 6);

        let zero_height = cases.iter().find(|c| c.name == "zero height").unwrap();
        assert_eq!((zero_height.width, zero_height.height), (4, 0));
        assert_eq!(zero_height.expect, Expectation::Succeeds);

        let flag = cases.iter().find(|c| c.name == "invalid flag").unwrap();
        assert_eq!(flag.flags.bits(), 100);

        let nvidia_only: Vec<_> = cases.iter().filter(|c| c.only_on.is_some()).collect();
        assert_eq!(nvidia_only.len(), 2);
        assert!(nvidia_only.iter().all(|c| !c.applies_to(Platform::Amd)));
    }

    #[test]
    fn test_null_cases_skipped_on_amd() {
        let runtime = DummyRuntime::new(1);
        let report = run_negative(&runtime, &ProbeConfig::default()).unwrap();

        assert!(report.passed(), "{}", report);
        assert_eq!(report.skipped().len(), 2);
        assert_eq!(
            report.outcome("null array pointer").unwrap().verdict,
            Verdict::Skipped
        );
        assert_eq!(report.outcome("zero width").unwrap().verdict, Verdict::Passed);
        assert_eq!(runtime.live_arrays(), 0);
    }

    #[test]
    fn test_null_cases_checked_on_nvidia() {
        let runtime = DummyRuntime::new(1).with_platform(Platform::Nvidia);
        let report = run_negative(&runtime, &ProbeConfig::default()).unwrap();

        assert!(report.passed(), "{}", report);
        assert!(report.skipped().is_empty());
        assert_eq!(
            report.outcome("null channel descriptor").unwrap().verdict,
            Verdict::Passed
        );
    }

    #[test]
    fn test_platform_override_from_config() {
        let runtime = DummyRuntime::new(1);
        let config = ProbeConfig::new().with_platform(Platform::Nvidia);
        let report = run_negative(&runtime, &config).unwrap();
        assert!(report.skipped().is_empty());
    }

    #[test]
    fn test_zero_height_allocation_is_released() {
        let runtime = DummyRuntime::new(1);
        let before = runtime.mem_get_info().unwrap();
        run_negative(&runtime, &ProbeConfig::default()).unwrap();
        assert_eq!(runtime.stats().allocations, 1);
        assert_eq!(runtime.stats().frees, 1);
        assert_eq!(runtime.mem_get_info().unwrap(), before);
    }
}

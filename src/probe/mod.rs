//! hipMallocArray conformance probes
//!
//! Each probe drives an [`ArrayRuntime`](crate::hip::ArrayRuntime) and
//! records one [`CaseOutcome`] per checked expectation. Two failure idioms
//! are kept apart:
//!
//! - a runtime call that must succeed (device selection, memory queries,
//!   frees) aborts the probe with an `Err`;
//! - an expectation check (an oracle status, a leak invariant) is recorded
//!   as [`Verdict::Failed`] and the probe carries on.

pub mod basic;
pub mod multi_device;
pub mod negative;
pub mod suite;
pub mod sweep;

use std::fmt;

use serde::Serialize;

use crate::hip::HipStatus;

pub use basic::run_basic;
pub use multi_device::run_multi_device;
pub use negative::{negative_cases, run_negative, NegativeCase};
pub use suite::{run_suite, SuiteReport};
pub use sweep::run_size_sweep;

/// Result of one checked expectation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Passed,
    Failed,
    /// Not applicable on this platform
    Skipped,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Passed => write!(f, "PASS"),
            Verdict::Failed => write!(f, "FAIL"),
            Verdict::Skipped => write!(f, "SKIP"),
        }
    }
}

/// Outcome an oracle expects from an allocation call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Expectation {
    Succeeds,
    Fails,
}

impl Expectation {
    pub fn matches(self, status: HipStatus) -> bool {
        match self {
            Expectation::Succeeds => status.is_success(),
            Expectation::Fails => !status.is_success(),
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Succeeds => write!(f, "success"),
            Expectation::Fails => write!(f, "failure"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseOutcome {
    pub name: String,
    pub verdict: Verdict,
    pub detail: String,
}

impl CaseOutcome {
    pub fn passed(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::with_verdict(name, Verdict::Passed, detail)
    }

    pub fn failed(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::with_verdict(name, Verdict::Failed, detail)
    }

    pub fn skipped(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::with_verdict(name, Verdict::Skipped, detail)
    }

    /// Passed when `ok`, failed otherwise
    pub fn check(name: impl Into<String>, ok: bool, detail: impl Into<String>) -> Self {
        let verdict = if ok { Verdict::Passed } else { Verdict::Failed };
        Self::with_verdict(name, verdict, detail)
    }

    fn with_verdict(name: impl Into<String>, verdict: Verdict, detail: impl Into<String>) -> Self {
        CaseOutcome {
            name: name.into(),
            verdict,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for CaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.verdict, self.name, self.detail)
    }
}

/// Outcomes of one probe run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    pub probe: String,
    pub outcomes: Vec<CaseOutcome>,
}

impl ProbeReport {
    pub fn new(probe: impl Into<String>) -> Self {
        ProbeReport {
            probe: probe.into(),
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: CaseOutcome) {
        match outcome.verdict {
            Verdict::Failed => tracing::error!(probe = %self.probe, "{}", outcome),
            Verdict::Skipped => tracing::info!(probe = %self.probe, "{}", outcome),
            Verdict::Passed => tracing::debug!(probe = %self.probe, "{}", outcome),
        }
        self.outcomes.push(outcome);
    }

    /// True when no recorded case failed
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.verdict != Verdict::Failed)
    }

    pub fn failures(&self) -> Vec<&CaseOutcome> {
        self.count_matching(Verdict::Failed)
    }

    pub fn skipped(&self) -> Vec<&CaseOutcome> {
        self.count_matching(Verdict::Skipped)
    }

    pub fn outcome(&self, name: &str) -> Option<&CaseOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    fn count_matching(&self, verdict: Verdict) -> Vec<&CaseOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.verdict == verdict)
            .collect()
    }
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({} cases)", self.probe, self.outcomes.len())?;
        for outcome in &self.outcomes {
            writeln!(f, "  {}", outcome)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expectation_matches_status() {
        assert!(Expectation::Succeeds.matches(HipStatus::SUCCESS));
        assert!(!Expectation::Succeeds.matches(HipStatus::INVALID_VALUE));
        assert!(Expectation::Fails.matches(HipStatus::OUT_OF_MEMORY));
        assert!(!Expectation::Fails.matches(HipStatus::SUCCESS));
    }

    #[test]
    fn test_report_skips_do_not_fail() {
        let mut report = ProbeReport::new("negative");
        report.push(CaseOutcome::passed("a", "ok"));
        report.push(CaseOutcome::skipped("b", "nvidia only"));
        assert!(report.passed());
        assert_eq!(report.skipped().len(), 1);

        report.push(CaseOutcome::check("c", false, "mismatch"));
        assert!(!report.passed());
        assert_eq!(report.failures()[0].name, "c");
        assert_eq!(report.outcome("b").unwrap().verdict, Verdict::Skipped);
    }

    #[test]
    fn test_report_serializes() {
        let mut report = ProbeReport::new("basic");
        report.push(CaseOutcome::passed("i32", "allocated 4x4"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["probe"], "basic");
        assert_eq!(json["outcomes"][0]["verdict"], "passed");
    }
}

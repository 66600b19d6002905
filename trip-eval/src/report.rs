//! Validation results
//!
//! Structures for representing and formatting the outcome of test cases.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Report for a batch of test cases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub run_id: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: chrono::DateTime<chrono::Utc>,
    pub results: Vec<CaseResult>,
    pub summary: ValidationSummary,
}

impl ValidationReport {
    pub fn new(results: Vec<CaseResult>, started_at: chrono::DateTime<chrono::Utc>) -> Self {
        let summary = ValidationSummary::from_results(&results);
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at,
            completed_at: chrono::Utc::now(),
            results,
            summary,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.summary.failed == 0
    }

    pub fn failures(&self) -> Vec<&CaseResult> {
        self.results.iter().filter(|r| !r.passed).collect()
    }

    /// Format as a human-readable string
    pub fn format_summary(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("Trace Validation: {}\n", self.run_id));
        output.push_str(&format!(
            "  Total: {}  Passed: {}  Failed: {}  Pass Rate: {:.1}%\n",
            self.summary.total,
            self.summary.passed,
            self.summary.failed,
            self.summary.pass_rate * 100.0
        ));

        for result in self.failures() {
            output.push_str(&format!("\nFAILED {}\n", result.case_id));
            for failure in &result.failures {
                output.push_str(&format!("  - {}\n", failure.format()));
            }
        }
        output
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Pass rate (0.0 - 1.0)
    pub pass_rate: f64,
}

impl ValidationSummary {
    pub fn from_results(results: &[CaseResult]) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();
        let pass_rate = if total > 0 { passed as f64 / total as f64 } else { 0.0 };
        Self { total, passed, failed: total - passed, pass_rate }
    }
}

/// Result for a single test case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    /// The case's first request, used as its identifier
    pub case_id: String,
    pub passed: bool,
    /// Scores computed along the way, keyed by check
    pub scores: BTreeMap<String, f64>,
    pub failures: Vec<Failure>,
    pub duration: Duration,
}

impl CaseResult {
    pub fn new(
        case_id: &str,
        scores: BTreeMap<String, f64>,
        failures: Vec<Failure>,
        duration: Duration,
    ) -> Self {
        Self {
            case_id: case_id.to_string(),
            passed: failures.is_empty(),
            scores,
            failures,
            duration,
        }
    }
}

/// A check that did not hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    /// What was checked, e.g. `test_output` or a span label
    pub check: String,
    pub message: String,
}

impl Failure {
    pub fn new(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self { check: check.into(), message: message.into() }
    }

    pub fn format(&self) -> String {
        format!("{}: {}", self.check, self.message)
    }
}

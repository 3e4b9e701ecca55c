//! Status rollups for reporting.
//!
//! Pure functions. The results are never written back to the parent's own
//! status field.

use crate::models::{ExecutionSummary, StepExecution, TestExecution};

/// Tally step execution statuses.
pub fn summarize_execution(steps: &[StepExecution]) -> ExecutionSummary {
    steps.iter().map(|s| s.status).collect()
}

/// Tally execution statuses of a run.
pub fn summarize_run(executions: &[TestExecution]) -> ExecutionSummary {
    executions.iter().map(|e| e.status).collect()
}

/// Share of passed items, rounded half up to a whole percent. Zero when empty.
pub fn completion_percentage(summary: &ExecutionSummary) -> u8 {
    if summary.total == 0 {
        return 0;
    }
    let passed = u64::from(summary.passed.min(summary.total));
    let total = u64::from(summary.total);
    ((passed * 200 + total) / (2 * total)) as u8
}

//! Rollup counts computed from child statuses.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ExecutionStatus;

/// Tally of statuses. Read-only reporting value, never written back to the
/// parent's own status field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExecutionSummary {
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub blocked: u32,
    pub skipped: u32,
    pub not_run: u32,
}

impl ExecutionSummary {
    /// Count one more child with the given status.
    pub fn record(&mut self, status: ExecutionStatus) {
        self.total += 1;
        match status {
            ExecutionStatus::Passed => self.passed += 1,
            ExecutionStatus::Failed => self.failed += 1,
            ExecutionStatus::Blocked => self.blocked += 1,
            ExecutionStatus::Skipped => self.skipped += 1,
            ExecutionStatus::NotRun => self.not_run += 1,
        }
    }

    /// Count for a single status bucket.
    pub fn count(&self, status: ExecutionStatus) -> u32 {
        match status {
            ExecutionStatus::Passed => self.passed,
            ExecutionStatus::Failed => self.failed,
            ExecutionStatus::Blocked => self.blocked,
            ExecutionStatus::Skipped => self.skipped,
            ExecutionStatus::NotRun => self.not_run,
        }
    }
}

impl FromIterator<ExecutionStatus> for ExecutionSummary {
    fn from_iter<I: IntoIterator<Item = ExecutionStatus>>(iter: I) -> Self {
        let mut summary = ExecutionSummary::default();
        for status in iter {
            summary.record(status);
        }
        summary
    }
}

//! Domain models for test run execution tracking.

pub mod activity;
pub mod actor;
pub mod evidence;
pub mod status;
pub mod step_execution;
pub mod summary;
pub mod test_case;
pub mod test_execution;
pub mod test_run;

// Re-export commonly used types
pub use activity::{ActivityAction, ActivityEntity, ActivityEvent};
pub use actor::ActorContext;
pub use evidence::{Evidence, EvidenceListResponse, EvidenceMetadata, EvidenceUpload};
pub use status::{ExecutionStatus, RunStatus};
pub use step_execution::{
    BulkStepUpdate, StepExecution, StepExecutionListResponse, StepUpdate, StepUpdateEntry,
    StepWithExecution,
};
pub use summary::ExecutionSummary;
pub use test_case::{NewTestCaseStep, TestCaseStep};
pub use test_execution::{
    ExecutionListResponse, ExecutionSummaryResponse, OverallResult, TestExecution,
};
pub use test_run::{
    AiInsightsRequest, CreateRunRequest, ListRunsParams, RunListResponse, RunMetadata,
    RunWithSummary, TestRun,
};

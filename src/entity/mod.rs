//! SeaORM entity definitions.

pub mod activity_log;
pub mod test_case;
pub mod test_case_step;
pub mod test_evidence;
pub mod test_execution;
pub mod test_run;
pub mod test_step_execution;

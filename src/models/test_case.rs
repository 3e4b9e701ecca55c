//! Catalog views of test cases and their steps.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::test_case_step;

/// One step of a test case as currently defined in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TestCaseStep {
    pub id: Uuid,
    pub test_case_id: Uuid,
    pub step_number: i32,
    pub description: String,
    pub expected_result: String,
}

impl From<test_case_step::Model> for TestCaseStep {
    fn from(model: test_case_step::Model) -> Self {
        TestCaseStep {
            id: model.id,
            test_case_id: model.test_case_id,
            step_number: model.step_number,
            description: model.description,
            expected_result: model.expected_result,
        }
    }
}

/// Step definition used when the CRUD layer creates a case.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewTestCaseStep {
    pub description: String,
    pub expected_result: String,
}

impl NewTestCaseStep {
    pub fn new(description: impl Into<String>, expected_result: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            expected_result: expected_result.into(),
        }
    }
}

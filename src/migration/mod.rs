//! SeaORM database migrations.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_test_cases;
mod m20260301_000002_create_test_runs;
mod m20260301_000003_create_test_executions;
mod m20260301_000004_create_test_step_executions;
mod m20260301_000005_create_test_evidence;
mod m20260301_000006_create_activity_log;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_test_cases::Migration),
            Box::new(m20260301_000002_create_test_runs::Migration),
            Box::new(m20260301_000003_create_test_executions::Migration),
            Box::new(m20260301_000004_create_test_step_executions::Migration),
            Box::new(m20260301_000005_create_test_evidence::Migration),
            Box::new(m20260301_000006_create_activity_log::Migration),
        ]
    }
}

//! Database module providing connection management, migrations, and the
//! execution store.
//!
//! Store operations are written against [`ExecutionStore`], which borrows any
//! SeaORM connection. Reads go through the pooled connection; operations that
//! must be all-or-nothing open a transaction with [`DbPool::begin`] and build a
//! store over it.

pub mod activity_log;
pub mod evidence;
pub mod step_executions;
pub mod test_cases;
pub mod test_executions;
pub mod test_runs;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection,
    DatabaseTransaction, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use tracing::{info, warn};

use crate::config::{Config, DatabaseSettings};
use crate::error::{AppError, AppResult};
use crate::migration::Migrator;

/// Shared database connection pool.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Create a new database pool from configuration.
    pub async fn new(config: &Config) -> AppResult<Self> {
        Self::connect(&config.database).await
    }

    /// Connect with explicit settings.
    pub async fn connect(settings: &DatabaseSettings) -> AppResult<Self> {
        let mut options = ConnectOptions::new(settings.url.clone());
        options
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .sqlx_logging(false);

        let conn = Database::connect(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        info!(
            "Database pool ready (backend={:?}, max_connections={})",
            conn.get_database_backend(),
            settings.max_connections
        );

        Ok(DbPool { conn })
    }

    /// Apply all pending migrations.
    pub async fn run_migrations(&self) -> AppResult<()> {
        Migrator::up(&self.conn, None)
            .await
            .map_err(|e| AppError::Database(format!("Migration failed: {}", e)))
    }

    /// Get the pooled connection.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    pub fn backend(&self) -> DatabaseBackend {
        self.conn.get_database_backend()
    }

    /// Start a transaction. Dropping it without `commit` rolls back.
    pub async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.conn
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))
    }

    /// Store over the pooled connection, for reads and single-row writes.
    pub fn store(&self) -> ExecutionStore<'_, DatabaseConnection> {
        ExecutionStore::new(&self.conn)
    }
}

/// Persistence operations for runs, executions, step executions and evidence.
///
/// Generic over the connection so the same code runs on the pool or inside a
/// transaction.
pub struct ExecutionStore<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> ExecutionStore<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    fn connection(&self) -> &'c C {
        self.conn
    }
}

/// Commit a transaction, mapping the error.
pub async fn commit(txn: DatabaseTransaction) -> AppResult<()> {
    txn.commit()
        .await
        .map_err(|e| AppError::Database(format!("Failed to commit transaction: {}", e)))
}

/// Roll back a transaction after a failed operation. The original error is
/// what the caller reports, so a rollback failure is only logged.
pub async fn rollback(txn: DatabaseTransaction) {
    if let Err(e) = txn.rollback().await {
        warn!("Failed to roll back transaction: {}", e);
    }
}

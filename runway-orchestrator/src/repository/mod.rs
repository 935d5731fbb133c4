//! Repository Module
//!
//! Persistence of execution records. The orchestrator only depends on the
//! [`ExecutionRepository`] trait; Postgres and in-memory implementations are
//! provided.

mod memory;
mod postgres;

pub use memory::InMemoryExecutionRepository;
pub use postgres::PgExecutionRepository;

use async_trait::async_trait;
use runway_core::domain::execution::Execution;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("execution {0} not found")]
    NotFound(Uuid),

    #[error("execution {0} already exists")]
    Duplicate(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to encode execution: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Keyed store of execution records
///
/// Writers are serialized per execution id by the orchestrator, so `update`
/// is a plain full-record replace.
#[async_trait]
pub trait ExecutionRepository: Send + Sync {
    /// Stores a new record
    ///
    /// Fails with `Duplicate` if the id, or the (script id, name) pair, is
    /// already taken.
    async fn insert(&self, execution: &Execution) -> Result<(), RepositoryError>;

    /// Replaces the record with the same id
    async fn update(&self, execution: &Execution) -> Result<(), RepositoryError>;

    async fn get(&self, id: Uuid) -> Result<Execution, RepositoryError>;

    /// Looks up a record by name within a script; absence is `Ok(None)`
    async fn find_by_name_and_script(
        &self,
        name: &str,
        script_id: &str,
    ) -> Result<Option<Execution>, RepositoryError>;

    /// All records of a script, newest first
    async fn list_by_script(&self, script_id: &str) -> Result<Vec<Execution>, RepositoryError>;

    /// The most recently created records, newest first
    async fn list_newest(&self, limit: usize) -> Result<Vec<Execution>, RepositoryError>;
}

/// Opens the repository for the configured database
///
/// Without a database URL records are kept in memory and lost on restart.
pub async fn connect(
    database_url: Option<&str>,
) -> Result<std::sync::Arc<dyn ExecutionRepository>, RepositoryError> {
    let Some(url) = database_url else {
        tracing::warn!("No database configured, execution records are kept in memory");
        return Ok(std::sync::Arc::new(InMemoryExecutionRepository::new()));
    };

    tracing::info!("Connecting to database...");
    let pool = crate::db::create_pool(url).await?;
    crate::db::run_migrations(&pool).await?;
    tracing::info!("Database connection pool created");

    Ok(std::sync::Arc::new(PgExecutionRepository::new(pool)))
}

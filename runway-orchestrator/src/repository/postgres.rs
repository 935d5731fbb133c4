//! Postgres execution repository
//!
//! Queryable columns are kept alongside the full record, which is stored as
//! JSONB so the schema does not have to follow every field of the record.

use async_trait::async_trait;
use runway_core::domain::execution::Execution;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use super::{ExecutionRepository, RepositoryError};

#[derive(Debug, Clone)]
pub struct PgExecutionRepository {
    pool: PgPool,
}

impl PgExecutionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ExecutionRow {
    record: Json<Execution>,
}

impl From<ExecutionRow> for Execution {
    fn from(row: ExecutionRow) -> Self {
        row.record.0
    }
}

fn map_insert_error(execution: &Execution, err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Duplicate(format!("{}/{}", execution.script_id, execution.name))
        }
        _ => RepositoryError::Database(err),
    }
}

#[async_trait]
impl ExecutionRepository for PgExecutionRepository {
    async fn insert(&self, execution: &Execution) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO executions (id, name, script_id, namespace, backend_id, status, created_at, record)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(execution.id)
        .bind(&execution.name)
        .bind(&execution.script_id)
        .bind(&execution.namespace)
        .bind(&execution.backend_id)
        .bind(execution.result.status.to_string())
        .bind(execution.created_at)
        .bind(Json(execution))
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(execution, e))?;

        Ok(())
    }

    async fn update(&self, execution: &Execution) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE executions
            SET status = $1, record = $2
            WHERE id = $3
            "#,
        )
        .bind(execution.result.status.to_string())
        .bind(Json(execution))
        .bind(execution.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(execution.id));
        }

        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Execution, RepositoryError> {
        let row = sqlx::query_as::<_, ExecutionRow>("SELECT record FROM executions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound(id))
    }

    async fn find_by_name_and_script(
        &self,
        name: &str,
        script_id: &str,
    ) -> Result<Option<Execution>, RepositoryError> {
        let row = sqlx::query_as::<_, ExecutionRow>(
            "SELECT record FROM executions WHERE name = $1 AND script_id = $2",
        )
        .bind(name)
        .bind(script_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_by_script(&self, script_id: &str) -> Result<Vec<Execution>, RepositoryError> {
        let rows = sqlx::query_as::<_, ExecutionRow>(
            r#"
            SELECT record FROM executions
            WHERE script_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(script_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_newest(&self, limit: usize) -> Result<Vec<Execution>, RepositoryError> {
        let rows = sqlx::query_as::<_, ExecutionRow>(
            r#"
            SELECT record FROM executions
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

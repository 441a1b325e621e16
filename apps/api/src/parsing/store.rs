use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::resume::ParseResultRow;
use crate::parsing::ParseResult;

/// Create/list store for persisted parse results.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn create(&self, result: &ParseResult) -> Result<()>;
    async fn list_recent(&self, limit: i64) -> Result<Vec<ParseResultRow>>;
    async fn get(&self, id: Uuid) -> Result<Option<ParseResultRow>>;
}

pub struct PgResultStore {
    pool: PgPool,
}

impl PgResultStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResultStore for PgResultStore {
    async fn create(&self, result: &ParseResult) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO parse_results
                (id, original_filename, file_url, parsing_method, parsing_status,
                 parsed_data, processing_time, confidence_score)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&result.original_filename)
        .bind(&result.file_url)
        .bind(result.parsing_method.as_str())
        .bind(result.parsing_status.as_str())
        .bind(&result.parsed_data)
        .bind(result.processing_time)
        .bind(result.confidence_score)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Most recent first; `created_at` is the ordering key.
    async fn list_recent(&self, limit: i64) -> Result<Vec<ParseResultRow>> {
        Ok(sqlx::query_as::<_, ParseResultRow>(
            "SELECT * FROM parse_results ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ParseResultRow>> {
        Ok(
            sqlx::query_as::<_, ParseResultRow>("SELECT * FROM parse_results WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }
}

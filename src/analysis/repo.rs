use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// One stored screening outcome. Rows are append-only: there is no update
/// or delete path, and the timestamp is assigned by the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnalysisResult {
    pub id: Uuid,
    pub user_id: Uuid,
    pub label: String,
    pub suggestion: String,
    pub audio_file_name: String,
    pub storage_key: Option<String>,
    pub created_at: OffsetDateTime,
}

impl AnalysisResult {
    pub async fn insert(
        db: &PgPool,
        user_id: Uuid,
        label: &str,
        suggestion: &str,
        audio_file_name: &str,
        storage_key: Option<&str>,
    ) -> anyhow::Result<AnalysisResult> {
        let row = sqlx::query_as::<_, AnalysisResult>(
            r#"
            INSERT INTO analysis_results (user_id, label, suggestion, audio_file_name, storage_key)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, label, suggestion, audio_file_name, storage_key, created_at
            "#,
        )
        .bind(user_id)
        .bind(label)
        .bind(suggestion)
        .bind(audio_file_name)
        .bind(storage_key)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<AnalysisResult>> {
        let rows = sqlx::query_as::<_, AnalysisResult>(
            r#"
            SELECT id, user_id, label, suggestion, audio_file_name, storage_key, created_at
            FROM analysis_results
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}

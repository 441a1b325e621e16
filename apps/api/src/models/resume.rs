use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ParseResultRow {
    pub id: Uuid,
    pub original_filename: String,
    pub file_url: Option<String>,
    pub parsing_method: String,
    pub parsing_status: String,
    pub parsed_data: Value,
    pub processing_time: f64,
    pub confidence_score: i32,
    pub created_at: DateTime<Utc>,
}

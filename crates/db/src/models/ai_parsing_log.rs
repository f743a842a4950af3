use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use super::parsed_sale::ParsedSale;

/// Outcome of one natural-language parse attempt.
#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display)]
#[sqlx(type_name = "parse_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ParseStatus {
    Success,
    ManualReview,
    FallbackUsed,
}

/// Append-only audit row, one per natural-language parse attempt.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct AiParsingLog {
    pub id: Uuid,
    pub input_text: String,
    pub parsed_data: String, // JSON-serialized ParsedSale
    pub confidence_score: f64,
    pub status: ParseStatus,
    pub model_used: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AiParsingLog {
    pub fn parsed(&self) -> Option<ParsedSale> {
        serde_json::from_str(&self.parsed_data).ok()
    }
}

#[derive(Debug, Clone)]
pub struct CreateAiParsingLog<'a> {
    pub input_text: &'a str,
    pub parsed: &'a ParsedSale,
    pub status: ParseStatus,
    pub model_used: Option<&'a str>,
    pub error_message: Option<&'a str>,
}

impl AiParsingLog {
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateAiParsingLog<'_>,
    ) -> Result<Self, sqlx::Error> {
        let parsed_data = serde_json::to_string(data.parsed)
            .map_err(|e| sqlx::Error::Protocol(e.to_string()))?;
        sqlx::query_as::<_, AiParsingLog>(
            r#"
            INSERT INTO ai_parsing_logs
                (id, input_text, parsed_data, confidence_score, status, model_used, error_message)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING
                id, input_text, parsed_data, confidence_score, status,
                model_used, error_message, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.input_text)
        .bind(parsed_data)
        .bind(data.parsed.confidence)
        .bind(data.status)
        .bind(data.model_used)
        .bind(data.error_message)
        .fetch_one(pool)
        .await
    }

    pub async fn find_recent(pool: &SqlitePool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, AiParsingLog>(
            r#"
            SELECT id, input_text, parsed_data, confidence_score, status,
                   model_used, error_message, created_at
            FROM ai_parsing_logs
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ai_parsing_logs")
            .fetch_one(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    #[tokio::test]
    async fn create_round_trips_parsed_data() {
        let db = DBService::new_in_memory().await.unwrap();
        let parsed = ParsedSale {
            customer_name: "Jay".to_string(),
            strain_name: Some("Stardust".to_string()),
            quantity_grams: Some(3.5),
            sale_price: Some(60.0),
            payment_method: None,
            confidence: 0.9,
            suggestions: vec![],
        };

        let log = AiParsingLog::create(
            &db.pool,
            &CreateAiParsingLog {
                input_text: "jay eighth of stardust 60",
                parsed: &parsed,
                status: ParseStatus::Success,
                model_used: Some("openai/gpt-4o-mini"),
                error_message: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(log.status, ParseStatus::Success);
        assert_eq!(log.confidence_score, 0.9);
        assert_eq!(log.parsed(), Some(parsed));
        assert_eq!(AiParsingLog::count(&db.pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn store_rejects_unknown_status() {
        let db = DBService::new_in_memory().await.unwrap();

        let result = sqlx::query(
            "INSERT INTO ai_parsing_logs (id, input_text, parsed_data, confidence_score, status) VALUES ($1, 'x', '{}', 0, 'pending')",
        )
        .bind(Uuid::new_v4())
        .execute(&db.pool)
        .await;

        assert!(result.is_err());
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(ParseStatus::ManualReview.to_string(), "manual_review");
        assert_eq!(
            serde_json::to_value(ParseStatus::FallbackUsed).unwrap(),
            serde_json::json!("fallback_used")
        );
    }
}

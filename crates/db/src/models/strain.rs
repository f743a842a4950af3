use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;

/// Inventory record for a strain. `strain_type` is free text (Indica, Sativa,
/// Hybrid, Edible, ...) and is exposed as `type` on the wire.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Strain {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub strain_type: String,
    pub cost_per_gram: f64,
    pub cost_per_pound: f64,
    pub current_stock_grams: f64,
    pub reorder_point: f64,
    pub emoji: String,
}

impl Strain {
    pub fn is_low_stock(&self) -> bool {
        self.current_stock_grams <= self.reorder_point
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Strain>(
            r#"
            SELECT id, name, strain_type, cost_per_gram, cost_per_pound,
                   current_stock_grams, reorder_point, emoji
            FROM strains
            ORDER BY name
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Case-insensitive lookup by exact name.
    pub async fn find_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Strain>(
            r#"
            SELECT id, name, strain_type, cost_per_gram, cost_per_pound,
                   current_stock_grams, reorder_point, emoji
            FROM strains
            WHERE name = $1 COLLATE NOCASE
            "#,
        )
        .bind(name.trim())
        .fetch_optional(pool)
        .await
    }

    pub async fn find_low_stock(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Strain>(
            r#"
            SELECT id, name, strain_type, cost_per_gram, cost_per_pound,
                   current_stock_grams, reorder_point, emoji
            FROM strains
            WHERE current_stock_grams <= reorder_point
            ORDER BY current_stock_grams - reorder_point
            "#,
        )
        .fetch_all(pool)
        .await
    }
}

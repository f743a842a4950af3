use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "payment_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Crypto,
    Other,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Sale {
    pub id: Uuid,
    pub customer_name: String,
    pub strain_name: Option<String>,
    pub quantity_grams: f64,
    pub sale_price: f64,
    pub cost_price: f64,
    pub profit: f64, // sale_price - cost_price
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A validated sale with derived cost and profit, ready to be written.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct NewSale {
    pub customer_name: String,
    pub strain_name: String,
    pub quantity_grams: f64,
    pub sale_price: f64,
    pub cost_price: f64,
    pub profit: f64,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

impl Sale {
    pub async fn create(pool: &SqlitePool, id: Uuid, data: &NewSale) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (
                id, customer_name, strain_name, quantity_grams,
                sale_price, cost_price, profit, payment_method, notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING
                id, customer_name, strain_name, quantity_grams,
                sale_price, cost_price, profit, payment_method, notes, created_at
            "#,
        )
        .bind(id)
        .bind(&data.customer_name)
        .bind(&data.strain_name)
        .bind(data.quantity_grams)
        .bind(data.sale_price)
        .bind(data.cost_price)
        .bind(data.profit)
        .bind(data.payment_method)
        .bind(&data.notes)
        .fetch_one(pool)
        .await
    }

    pub async fn find_recent(pool: &SqlitePool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Sale>(
            r#"
            SELECT
                id, customer_name, strain_name, quantity_grams,
                sale_price, cost_price, profit, payment_method, notes, created_at
            FROM sales
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Build the record a write would have produced, without touching the store.
    pub fn simulated(id: Uuid, data: &NewSale) -> Self {
        Self {
            id,
            customer_name: data.customer_name.clone(),
            strain_name: Some(data.strain_name.clone()),
            quantity_grams: data.quantity_grams,
            sale_price: data.sale_price,
            cost_price: data.cost_price,
            profit: data.profit,
            payment_method: data.payment_method,
            notes: data.notes.clone(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::DBService;

    fn sample(customer: &str, price: f64) -> NewSale {
        NewSale {
            customer_name: customer.to_string(),
            strain_name: "Stardust".to_string(),
            quantity_grams: 7.0,
            sale_price: price,
            cost_price: 42.0,
            profit: price - 42.0,
            payment_method: PaymentMethod::Card,
            notes: Some("regular order".to_string()),
        }
    }

    #[tokio::test]
    async fn create_returns_stored_row() {
        let db = DBService::new_in_memory().await.unwrap();
        let id = Uuid::new_v4();

        let sale = Sale::create(&db.pool, id, &sample("Jay", 180.0)).await.unwrap();

        assert_eq!(sale.id, id);
        assert_eq!(sale.customer_name, "Jay");
        assert_eq!(sale.strain_name.as_deref(), Some("Stardust"));
        assert_eq!(sale.profit, 138.0);
        assert_eq!(sale.payment_method, PaymentMethod::Card);
    }

    #[tokio::test]
    async fn identical_submissions_create_two_rows() {
        let db = DBService::new_in_memory().await.unwrap();
        let data = sample("Ryan", 300.0);

        Sale::create(&db.pool, Uuid::new_v4(), &data).await.unwrap();
        Sale::create(&db.pool, Uuid::new_v4(), &data).await.unwrap();

        let recent = Sale::find_recent(&db.pool, 10).await.unwrap();
        assert_eq!(recent.len(), 2);
    }

    #[tokio::test]
    async fn store_rejects_non_positive_quantity() {
        let db = DBService::new_in_memory().await.unwrap();
        let mut data = sample("Jay", 100.0);
        data.quantity_grams = 0.0;

        assert!(Sale::create(&db.pool, Uuid::new_v4(), &data).await.is_err());
    }

    #[test]
    fn payment_method_parses_case_insensitively() {
        assert_eq!(PaymentMethod::from_str("CRYPTO").unwrap(), PaymentMethod::Crypto);
        assert_eq!(PaymentMethod::from_str("card").unwrap(), PaymentMethod::Card);
        assert!(PaymentMethod::from_str("venmo").is_err());
        assert_eq!(PaymentMethod::default().to_string(), "cash");
    }
}

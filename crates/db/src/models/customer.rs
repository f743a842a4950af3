use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;

/// Per-customer aggregate over the sales ledger. Customers are not stored on
/// their own; the name is free text and identifies the customer.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct CustomerSummary {
    pub customer_name: String,
    pub total_profit: f64,
    pub transaction_count: i64,
    pub avg_profit: f64,
    pub last_purchase: Option<DateTime<Utc>>,
}

impl CustomerSummary {
    /// Whole days since the last purchase, if any purchase is on record.
    pub fn days_since_last_purchase(&self, now: DateTime<Utc>) -> Option<i64> {
        self.last_purchase
            .map(|last| (now - last).num_days().max(0))
    }

    /// Customers ordered by total profit, highest first.
    pub async fn top(pool: &SqlitePool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CustomerSummary>(
            r#"
            SELECT
                customer_name,
                CAST(SUM(profit) AS REAL) AS total_profit,
                COUNT(*)                  AS transaction_count,
                CAST(AVG(profit) AS REAL) AS avg_profit,
                MAX(sale_date)            AS last_purchase
            FROM historic_profits
            GROUP BY customer_name
            ORDER BY total_profit DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Case-insensitive substring match on the customer name. An empty query
    /// returns every customer.
    pub async fn search(pool: &SqlitePool, query: &str) -> Result<Vec<Self>, sqlx::Error> {
        let pattern = format!("%{}%", escape_like(query.trim()));
        sqlx::query_as::<_, CustomerSummary>(
            r#"
            SELECT
                customer_name,
                CAST(SUM(profit) AS REAL) AS total_profit,
                COUNT(*)                  AS transaction_count,
                CAST(AVG(profit) AS REAL) AS avg_profit,
                MAX(sale_date)            AS last_purchase
            FROM historic_profits
            WHERE customer_name LIKE $1 ESCAPE '\'
            GROUP BY customer_name
            ORDER BY total_profit DESC
            "#,
        )
        .bind(pattern)
        .fetch_all(pool)
        .await
    }
}

fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use uuid::Uuid;

    use super::*;
    use crate::{
        DBService,
        models::sale::{NewSale, PaymentMethod, Sale},
    };

    async fn record(pool: &SqlitePool, customer: &str, profit: f64) {
        let data = NewSale {
            customer_name: customer.to_string(),
            strain_name: "Candyland".to_string(),
            quantity_grams: 3.5,
            sale_price: profit + 21.0,
            cost_price: 21.0,
            profit,
            payment_method: PaymentMethod::Cash,
            notes: None,
        };
        Sale::create(pool, Uuid::new_v4(), &data).await.unwrap();
    }

    #[tokio::test]
    async fn top_aggregates_and_orders_by_profit() {
        let db = DBService::new_in_memory().await.unwrap();
        record(&db.pool, "Jay", 100.0).await;
        record(&db.pool, "Jay", 200.0).await;
        record(&db.pool, "Trife", 500.0).await;
        record(&db.pool, "Online", 50.0).await;

        let top = CustomerSummary::top(&db.pool, 2).await.unwrap();

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].customer_name, "Trife");
        assert_eq!(top[1].customer_name, "Jay");
        assert_eq!(top[1].total_profit, 300.0);
        assert_eq!(top[1].transaction_count, 2);
        assert_eq!(top[1].avg_profit, 150.0);
        assert!(top[1].last_purchase.is_some());
    }

    #[tokio::test]
    async fn search_matches_substring_without_case() {
        let db = DBService::new_in_memory().await.unwrap();
        record(&db.pool, "Karlo", 100.0).await;
        record(&db.pool, "Carla", 80.0).await;
        record(&db.pool, "Mike", 40.0).await;

        let found = CustomerSummary::search(&db.pool, "ARL").await.unwrap();
        let names: Vec<_> = found.iter().map(|c| c.customer_name.as_str()).collect();
        assert_eq!(names, ["Karlo", "Carla"]);

        let everyone = CustomerSummary::search(&db.pool, "").await.unwrap();
        assert_eq!(everyone.len(), 3);

        let none = CustomerSummary::search(&db.pool, "%").await.unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn days_since_last_purchase_uses_whole_days() {
        let now = Utc::now();
        let summary = CustomerSummary {
            customer_name: "Sarah".to_string(),
            total_profit: 380.0,
            transaction_count: 2,
            avg_profit: 190.0,
            last_purchase: Some(now - Duration::hours(49)),
        };

        assert_eq!(summary.days_since_last_purchase(now), Some(2));
    }
}

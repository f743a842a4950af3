use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;

/// One day of the profit ledger.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct DailyProfit {
    pub date: NaiveDate,
    pub total_profit: f64,
    pub transaction_count: i64,
    pub avg_profit: f64,
}

impl DailyProfit {
    /// Days with at least one sale inside the last `days` days, newest first.
    pub async fn last_days(pool: &SqlitePool, days: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, DailyProfit>(
            r#"
            SELECT
                DATE(sale_date)           AS date,
                CAST(SUM(profit) AS REAL) AS total_profit,
                COUNT(*)                  AS transaction_count,
                CAST(AVG(profit) AS REAL) AS avg_profit
            FROM historic_profits
            WHERE DATE(sale_date) >= DATE('now', '-' || $1 || ' days')
            GROUP BY DATE(sale_date)
            ORDER BY date DESC
            "#,
        )
        .bind(days)
        .fetch_all(pool)
        .await
    }
}

/// A point on the profit chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ProfitChartPoint {
    pub date: NaiveDate,
    pub total_profit: f64,
    pub transaction_count: i64,
}

impl From<&DailyProfit> for ProfitChartPoint {
    fn from(day: &DailyProfit) -> Self {
        Self {
            date: day.date,
            total_profit: day.total_profit,
            transaction_count: day.transaction_count,
        }
    }
}

/// Chart points for the last `days` days, oldest first.
pub fn chart_points(days: &[DailyProfit]) -> Vec<ProfitChartPoint> {
    days.iter().rev().map(ProfitChartPoint::from).collect()
}

/// Sum of `total_profit` across the given days.
pub fn total_profit(days: &[DailyProfit]) -> f64 {
    days.iter().map(|d| d.total_profit).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    async fn insert_at(pool: &SqlitePool, customer: &str, profit: f64, days_ago: i64) {
        sqlx::query(
            r#"
            INSERT INTO sales (id, customer_name, strain_name, quantity_grams,
                               sale_price, cost_price, profit, created_at)
            VALUES ($1, $2, 'Stardust', 7, $3, 42, $4, datetime('now', '-' || $5 || ' days'))
            "#,
        )
        .bind(uuid::Uuid::new_v4())
        .bind(customer)
        .bind(profit + 42.0)
        .bind(profit)
        .bind(days_ago)
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn groups_by_day_newest_first_within_window() {
        let db = DBService::new_in_memory().await.unwrap();
        insert_at(&db.pool, "Jay", 100.0, 0).await;
        insert_at(&db.pool, "Ryan", 50.0, 0).await;
        insert_at(&db.pool, "Trife", 300.0, 2).await;
        insert_at(&db.pool, "Old", 999.0, 45).await;

        let days = DailyProfit::last_days(&db.pool, 30).await.unwrap();

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].total_profit, 150.0);
        assert_eq!(days[0].transaction_count, 2);
        assert_eq!(days[0].avg_profit, 75.0);
        assert!(days[0].date > days[1].date);
        assert_eq!(total_profit(&days), 450.0);
    }

    #[tokio::test]
    async fn chart_points_run_oldest_first() {
        let db = DBService::new_in_memory().await.unwrap();
        insert_at(&db.pool, "Jay", 100.0, 0).await;
        insert_at(&db.pool, "Trife", 300.0, 3).await;

        let days = DailyProfit::last_days(&db.pool, 30).await.unwrap();
        let points = chart_points(&days);

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].total_profit, 300.0);
        assert_eq!(points[1].total_profit, 100.0);
        assert!(points[0].date < points[1].date);
    }
}

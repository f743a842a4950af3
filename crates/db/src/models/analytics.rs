//! Aggregates behind the analytics view: trends, per-strain performance,
//! customer tiers, sales by hour, margins and period-over-period growth.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

/// Bucket size for profit trends.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AnalyticsPeriod {
    #[default]
    #[serde(alias = "day")]
    Daily,
    #[serde(alias = "week")]
    Weekly,
    #[serde(alias = "month")]
    Monthly,
}

impl AnalyticsPeriod {
    fn bucket_format(self) -> &'static str {
        match self {
            Self::Daily => "%Y-%m-%d",
            Self::Weekly => "%Y-W%W",
            Self::Monthly => "%Y-%m",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ProfitTrend {
    pub period: String,
    pub total_profit: f64,
    pub transaction_count: i64,
    pub avg_profit: f64,
    pub max_profit: f64,
    pub min_profit: f64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct StrainPerformance {
    pub strain_name: String,
    pub total_profit: f64,
    pub sales_count: i64,
    pub avg_profit: f64,
    pub total_grams_sold: f64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CustomerTier {
    pub tier: String,
    pub customer_count: i64,
    pub tier_profit: f64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct HourlySales {
    pub hour: i64,
    pub total_profit: f64,
    pub transaction_count: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ProfitMargin {
    pub strain_name: String,
    pub cost_per_gram: f64,
    pub avg_price_per_gram: f64,
    pub avg_profit_margin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct GrowthMetrics {
    pub current_profit: f64,
    pub previous_profit: f64,
    /// Percent change, rounded to two decimals. Zero when there is no previous profit.
    pub growth_rate: f64,
}

impl GrowthMetrics {
    pub fn new(current_profit: f64, previous_profit: f64) -> Self {
        let growth_rate = if previous_profit > 0.0 {
            ((current_profit - previous_profit) / previous_profit * 100.0 * 100.0).round() / 100.0
        } else {
            0.0
        };
        Self {
            current_profit,
            previous_profit,
            growth_rate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub profit_trends: Vec<ProfitTrend>,
    pub strain_performance: Vec<StrainPerformance>,
    pub customer_distribution: Vec<CustomerTier>,
    pub hourly_sales: Vec<HourlySales>,
    pub profit_margins: Vec<ProfitMargin>,
    pub growth_metrics: GrowthMetrics,
}

impl Analytics {
    pub async fn load(
        pool: &SqlitePool,
        period: AnalyticsPeriod,
        days: i64,
    ) -> Result<Self, sqlx::Error> {
        Ok(Self {
            profit_trends: Self::profit_trends(pool, period, days).await?,
            strain_performance: Self::strain_performance(pool, days).await?,
            customer_distribution: Self::customer_distribution(pool).await?,
            hourly_sales: Self::hourly_sales(pool, days).await?,
            profit_margins: Self::profit_margins(pool).await?,
            growth_metrics: Self::growth_metrics(pool, days).await?,
        })
    }

    pub async fn profit_trends(
        pool: &SqlitePool,
        period: AnalyticsPeriod,
        days: i64,
    ) -> Result<Vec<ProfitTrend>, sqlx::Error> {
        // The bucket format comes from a closed enum, never from the request.
        let sql = format!(
            r#"
            SELECT
                strftime('{fmt}', sale_date) AS period,
                CAST(SUM(profit) AS REAL)    AS total_profit,
                COUNT(*)                     AS transaction_count,
                CAST(AVG(profit) AS REAL)    AS avg_profit,
                CAST(MAX(profit) AS REAL)    AS max_profit,
                CAST(MIN(profit) AS REAL)    AS min_profit
            FROM historic_profits
            WHERE DATE(sale_date) >= DATE('now', '-' || $1 || ' days')
            GROUP BY period
            ORDER BY period DESC
            "#,
            fmt = period.bucket_format()
        );
        sqlx::query_as::<_, ProfitTrend>(&sql)
            .bind(days)
            .fetch_all(pool)
            .await
    }

    pub async fn strain_performance(
        pool: &SqlitePool,
        days: i64,
    ) -> Result<Vec<StrainPerformance>, sqlx::Error> {
        sqlx::query_as::<_, StrainPerformance>(
            r#"
            SELECT
                strain_name,
                CAST(SUM(profit) AS REAL)         AS total_profit,
                COUNT(*)                          AS sales_count,
                CAST(AVG(profit) AS REAL)         AS avg_profit,
                CAST(SUM(quantity_grams) AS REAL) AS total_grams_sold
            FROM historic_profits
            WHERE strain_name IS NOT NULL
              AND DATE(sale_date) >= DATE('now', '-' || $1 || ' days')
            GROUP BY strain_name
            ORDER BY total_profit DESC
            "#,
        )
        .bind(days)
        .fetch_all(pool)
        .await
    }

    /// Customers bucketed by lifetime profit, highest tier first.
    pub async fn customer_distribution(pool: &SqlitePool) -> Result<Vec<CustomerTier>, sqlx::Error> {
        sqlx::query_as::<_, CustomerTier>(
            r#"
            WITH totals AS (
                SELECT customer_name, SUM(profit) AS total
                FROM historic_profits
                GROUP BY customer_name
            )
            SELECT
                CASE
                    WHEN total >= 1000 THEN 'Whale ($1000+)'
                    WHEN total >= 500  THEN 'VIP ($500-999)'
                    WHEN total >= 100  THEN 'Regular ($100-499)'
                    ELSE 'New (<$100)'
                END                     AS tier,
                COUNT(*)                AS customer_count,
                CAST(SUM(total) AS REAL) AS tier_profit
            FROM totals
            GROUP BY tier
            ORDER BY MIN(total) DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn hourly_sales(pool: &SqlitePool, days: i64) -> Result<Vec<HourlySales>, sqlx::Error> {
        sqlx::query_as::<_, HourlySales>(
            r#"
            SELECT
                CAST(strftime('%H', sale_date) AS INTEGER) AS hour,
                CAST(SUM(profit) AS REAL)                  AS total_profit,
                COUNT(*)                                   AS transaction_count
            FROM historic_profits
            WHERE DATE(sale_date) >= DATE('now', '-' || $1 || ' days')
            GROUP BY hour
            ORDER BY hour
            "#,
        )
        .bind(days)
        .fetch_all(pool)
        .await
    }

    /// Average price per gram against the strain's cost on file.
    pub async fn profit_margins(pool: &SqlitePool) -> Result<Vec<ProfitMargin>, sqlx::Error> {
        sqlx::query_as::<_, ProfitMargin>(
            r#"
            SELECT
                s.name                                           AS strain_name,
                s.cost_per_gram                                  AS cost_per_gram,
                CAST(AVG(h.sale_price / h.quantity_grams) AS REAL) AS avg_price_per_gram,
                CAST(ROUND(
                    (AVG(h.sale_price / h.quantity_grams) - s.cost_per_gram)
                    / AVG(h.sale_price / h.quantity_grams) * 100, 1
                ) AS REAL)                                       AS avg_profit_margin
            FROM historic_profits h
            JOIN strains s ON s.name = h.strain_name COLLATE NOCASE
            GROUP BY s.id
            ORDER BY avg_profit_margin DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Profit over the last `days` days against the `days` before that.
    pub async fn growth_metrics(pool: &SqlitePool, days: i64) -> Result<GrowthMetrics, sqlx::Error> {
        let (current, previous): (f64, f64) = sqlx::query_as(
            r#"
            SELECT
                CAST(COALESCE(SUM(CASE
                    WHEN DATE(sale_date) >= DATE('now', '-' || $1 || ' days') THEN profit
                END), 0.0) AS REAL) AS current_profit,
                CAST(COALESCE(SUM(CASE
                    WHEN DATE(sale_date) <  DATE('now', '-' || $1 || ' days')
                     AND DATE(sale_date) >= DATE('now', '-' || ($1 * 2) || ' days') THEN profit
                END), 0.0) AS REAL) AS previous_profit
            FROM historic_profits
            "#,
        )
        .bind(days)
        .fetch_one(pool)
        .await?;

        Ok(GrowthMetrics::new(current, previous))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::DBService;

    async fn insert_at(pool: &SqlitePool, customer: &str, strain: &str, grams: f64, price: f64, days_ago: i64) {
        let cost = grams * 6.0;
        sqlx::query(
            r#"
            INSERT INTO sales (id, customer_name, strain_name, quantity_grams,
                               sale_price, cost_price, profit, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, datetime('now', '-' || $8 || ' days'))
            "#,
        )
        .bind(uuid::Uuid::new_v4())
        .bind(customer)
        .bind(strain)
        .bind(grams)
        .bind(price)
        .bind(cost)
        .bind(price - cost)
        .bind(days_ago)
        .execute(pool)
        .await
        .unwrap();
    }

    #[test]
    fn growth_rate_is_rounded_percent() {
        assert_eq!(GrowthMetrics::new(15500.0, 12000.0).growth_rate, 29.17);
        assert_eq!(GrowthMetrics::new(500.0, 0.0).growth_rate, 0.0);
    }

    #[test]
    fn period_accepts_short_aliases() {
        let p: AnalyticsPeriod = serde_json::from_str("\"week\"").unwrap();
        assert_eq!(p, AnalyticsPeriod::Weekly);
        assert_eq!(AnalyticsPeriod::from_str("monthly").unwrap(), AnalyticsPeriod::Monthly);
    }

    #[tokio::test]
    async fn load_aggregates_the_ledger() {
        let db = DBService::new_in_memory().await.unwrap();
        insert_at(&db.pool, "Trife", "Stardust", 28.0, 1400.0, 1).await;
        insert_at(&db.pool, "Jay", "Candyland", 7.0, 180.0, 2).await;
        insert_at(&db.pool, "Jay", "Candyland", 3.5, 60.0, 40).await;

        let analytics = Analytics::load(&db.pool, AnalyticsPeriod::Daily, 30).await.unwrap();

        assert_eq!(analytics.profit_trends.len(), 2);
        assert_eq!(analytics.strain_performance[0].strain_name, "Stardust");
        assert_eq!(analytics.strain_performance[0].total_grams_sold, 28.0);

        let tiers: Vec<_> = analytics.customer_distribution.iter().map(|t| t.tier.as_str()).collect();
        assert_eq!(tiers, ["Whale ($1000+)", "Regular ($100-499)"]);

        let candyland = analytics
            .profit_margins
            .iter()
            .find(|m| m.strain_name == "Candyland")
            .unwrap();
        assert_eq!(candyland.cost_per_gram, 7.0);

        assert_eq!(analytics.growth_metrics.current_profit, 1232.0 + 138.0);
        assert_eq!(analytics.growth_metrics.previous_profit, 39.0);
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use ts_rs::TS;

use super::{
    customer::CustomerSummary,
    daily_profit::{self, DailyProfit},
};

pub const DASHBOARD_WINDOW_DAYS: i64 = 30;
const NO_CUSTOMERS: &str = "No customers yet";

/// Headline numbers for the dashboard, profits rounded to whole dollars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_profit: i64,
    pub total_transactions: i64,
    pub top_customer: String,
    pub today_profit: i64,
}

impl DashboardStats {
    pub fn from_parts(
        top_customer: Option<&CustomerSummary>,
        days: &[DailyProfit],
        today: NaiveDate,
    ) -> Self {
        let today_profit = days
            .iter()
            .find(|d| d.date == today)
            .map(|d| d.total_profit)
            .unwrap_or(0.0);

        Self {
            total_profit: daily_profit::total_profit(days).round() as i64,
            total_transactions: days.iter().map(|d| d.transaction_count).sum(),
            top_customer: top_customer
                .map(|c| c.customer_name.clone())
                .unwrap_or_else(|| NO_CUSTOMERS.to_string()),
            today_profit: today_profit.round() as i64,
        }
    }

    pub async fn load(pool: &SqlitePool, today: NaiveDate) -> Result<Self, sqlx::Error> {
        let top = CustomerSummary::top(pool, 1).await?;
        let days = DailyProfit::last_days(pool, DASHBOARD_WINDOW_DAYS).await?;
        Ok(Self::from_parts(top.first(), &days, today))
    }
}

//! Sample data served when the store is unreachable. Built from the same
//! types as the live responses so the shapes cannot drift apart.

use chrono::{DateTime, NaiveDate, Utc};
use db::models::{
    analytics::{
        Analytics, CustomerTier, GrowthMetrics, HourlySales, ProfitMargin, ProfitTrend,
        StrainPerformance,
    },
    customer::CustomerSummary,
    daily_profit::ProfitChartPoint,
    dashboard::DashboardStats,
    strain::Strain,
};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_default()
}

fn midnight(s: &str) -> Option<DateTime<Utc>> {
    date(s).and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())
}

pub fn dashboard_stats() -> DashboardStats {
    DashboardStats {
        total_profit: 15500,
        total_transactions: 45,
        top_customer: "Trife".to_string(),
        today_profit: 0,
    }
}

pub fn customers() -> Vec<CustomerSummary> {
    [
        ("Trife", 2300.0, 8, 287.50, "2024-01-15"),
        ("Online", 2045.0, 12, 170.42, "2024-01-14"),
        ("Ryan", 1580.0, 6, 263.33, "2024-01-13"),
        ("Jay", 750.0, 4, 187.50, "2024-01-12"),
        ("Leveny", 650.0, 3, 216.67, "2024-01-11"),
        ("Karlo", 690.0, 2, 345.00, "2024-01-10"),
        ("Mike", 420.0, 3, 140.00, "2024-01-09"),
        ("Sarah", 380.0, 2, 190.00, "2024-01-08"),
        ("Alex", 290.0, 2, 145.00, "2024-01-07"),
        ("Chris", 250.0, 1, 250.00, "2024-01-06"),
        ("Jordan", 180.0, 1, 180.00, "2024-01-05"),
        ("Taylor", 160.0, 1, 160.00, "2024-01-04"),
    ]
    .into_iter()
    .map(|(name, total_profit, transaction_count, avg_profit, last)| CustomerSummary {
        customer_name: name.to_string(),
        total_profit,
        transaction_count,
        avg_profit,
        last_purchase: midnight(last),
    })
    .collect()
}

pub fn strains() -> Vec<Strain> {
    [
        (1, "Girl Scout Cookies", "Hybrid", 8.50, 2700.0, 850.0, 200.0, "🍪"),
        (2, "Purple Chem", "Indica", 7.50, 3000.0, 1200.0, 300.0, "💜"),
        (3, "Stardust", "Sativa", 7.75, 2700.0, 650.0, 250.0, "✨"),
        (4, "Candyland", "Sativa", 7.00, 2600.0, 180.0, 200.0, "🍭"),
    ]
    .into_iter()
    .map(
        |(id, name, strain_type, cost_per_gram, cost_per_pound, stock, reorder_point, emoji)| Strain {
            id,
            name: name.to_string(),
            strain_type: strain_type.to_string(),
            cost_per_gram,
            cost_per_pound,
            current_stock_grams: stock,
            reorder_point,
            emoji: emoji.to_string(),
        },
    )
    .collect()
}

pub fn profit_chart() -> Vec<ProfitChartPoint> {
    [
        ("2024-01-10", 450.0, 3),
        ("2024-01-11", 680.0, 4),
        ("2024-01-12", 320.0, 2),
        ("2024-01-13", 890.0, 5),
        ("2024-01-14", 560.0, 3),
        ("2024-01-15", 720.0, 4),
        ("2024-01-16", 410.0, 2),
    ]
    .into_iter()
    .map(|(day, total_profit, transaction_count)| ProfitChartPoint {
        date: date(day),
        total_profit,
        transaction_count,
    })
    .collect()
}

pub fn analytics() -> Analytics {
    let profit_trends = [
        ("2024-01-20", 850.0, 3, 283.33, 400.0, 180.0),
        ("2024-01-19", 1200.0, 4, 300.0, 450.0, 200.0),
        ("2024-01-18", 950.0, 3, 316.67, 380.0, 250.0),
        ("2024-01-17", 1100.0, 4, 275.0, 350.0, 220.0),
        ("2024-01-16", 750.0, 2, 375.0, 400.0, 350.0),
        ("2024-01-15", 1300.0, 5, 260.0, 380.0, 180.0),
        ("2024-01-14", 900.0, 3, 300.0, 420.0, 200.0),
    ]
    .into_iter()
    .map(|(period, total_profit, transaction_count, avg_profit, max_profit, min_profit)| ProfitTrend {
        period: period.to_string(),
        total_profit,
        transaction_count,
        avg_profit,
        max_profit,
        min_profit,
    })
    .collect();

    let strain_performance = [
        ("Girl Scout Cookies", 2800.0, 12, 233.33, 336.0),
        ("Purple Chem", 2500.0, 10, 250.0, 280.0),
        ("Stardust", 2200.0, 9, 244.44, 252.0),
        ("Candyland", 1900.0, 8, 237.50, 224.0),
    ]
    .into_iter()
    .map(|(strain_name, total_profit, sales_count, avg_profit, total_grams_sold)| StrainPerformance {
        strain_name: strain_name.to_string(),
        total_profit,
        sales_count,
        avg_profit,
        total_grams_sold,
    })
    .collect();

    let customer_distribution = [
        ("Whale ($1000+)", 3, 6800.0),
        ("VIP ($500-999)", 5, 3200.0),
        ("Regular ($100-499)", 8, 2400.0),
        ("New (<$100)", 12, 800.0),
    ]
    .into_iter()
    .map(|(tier, customer_count, tier_profit)| CustomerTier {
        tier: tier.to_string(),
        customer_count,
        tier_profit,
    })
    .collect();

    let hourly_sales = [
        (10, 450.0, 2),
        (11, 680.0, 3),
        (12, 920.0, 4),
        (13, 1200.0, 5),
        (14, 1450.0, 6),
        (15, 1680.0, 7),
        (16, 1920.0, 8),
        (17, 2100.0, 9),
        (18, 1850.0, 7),
        (19, 1600.0, 6),
        (20, 1200.0, 4),
        (21, 800.0, 3),
    ]
    .into_iter()
    .map(|(hour, total_profit, transaction_count)| HourlySales {
        hour,
        total_profit,
        transaction_count,
    })
    .collect();

    let profit_margins = [
        ("Candyland", 7.00, 25.50, 72.5),
        ("Purple Chem", 7.50, 25.00, 70.0),
        ("Stardust", 7.75, 24.50, 68.4),
        ("Girl Scout Cookies", 8.50, 24.00, 64.6),
    ]
    .into_iter()
    .map(|(strain_name, cost_per_gram, avg_price_per_gram, avg_profit_margin)| ProfitMargin {
        strain_name: strain_name.to_string(),
        cost_per_gram,
        avg_price_per_gram,
        avg_profit_margin,
    })
    .collect();

    Analytics {
        profit_trends,
        strain_performance,
        customer_distribution,
        hourly_sales,
        profit_margins,
        growth_metrics: GrowthMetrics {
            current_profit: 15500.0,
            previous_profit: 12000.0,
            growth_rate: 29.2,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashboard_fallback_matches_published_numbers() {
        assert_eq!(
            serde_json::to_value(dashboard_stats()).unwrap(),
            serde_json::json!({
                "totalProfit": 15500,
                "totalTransactions": 45,
                "topCustomer": "Trife",
                "todayProfit": 0
            })
        );
    }

    #[test]
    fn sample_dates_parse() {
        assert!(customers().iter().all(|c| c.last_purchase.is_some()));
        assert_eq!(profit_chart()[0].date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
    }

    #[test]
    fn candyland_is_the_low_stock_sample() {
        let low: Vec<_> = strains().into_iter().filter(Strain::is_low_stock).collect();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "Candyland");
    }
}

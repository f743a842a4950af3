//! Validates sale submissions, derives cost and profit, and writes the row.

use std::str::FromStr;

use db::models::{
    sale::{NewSale, PaymentMethod, Sale},
    strain::Strain,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

pub const DEFAULT_COST_PER_GRAM: f64 = 6.0;

#[derive(Debug, Error)]
pub enum SaleError {
    #[error("{0}")]
    Validation(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Sale as submitted by the dashboard. Everything is optional here so that
/// missing fields are reported by name.
#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct SaleSubmission {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub strain_name: Option<String>,
    #[serde(default)]
    pub quantity_grams: Option<f64>,
    #[serde(default)]
    pub sale_price: Option<f64>,
    #[serde(default)]
    pub cost_price: Option<f64>,
    /// Ignored: profit is always derived.
    #[serde(default)]
    pub profit: Option<f64>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A written sale, or one fabricated because the store was unreachable.
#[derive(Debug, Clone, Serialize, TS)]
pub struct RecordedSale {
    #[serde(flatten)]
    pub sale: Sale,
    pub simulated: bool,
}

fn required_text(field: &str, value: Option<&str>) -> Result<String, SaleError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SaleError::Validation(format!("{} is required", field)))
}

fn required_amount(field: &str, value: Option<f64>) -> Result<f64, SaleError> {
    match value {
        None => Err(SaleError::Validation(format!("{} is required", field))),
        Some(v) if v == 0.0 => Err(SaleError::Validation(format!("{} is required", field))),
        Some(v) if !v.is_finite() || v < 0.0 => Err(SaleError::Validation(format!(
            "{} must be greater than 0",
            field
        ))),
        Some(v) => Ok(v),
    }
}

pub struct SaleRecorder {
    pool: SqlitePool,
    default_cost_per_gram: f64,
    simulate_when_offline: bool,
}

impl SaleRecorder {
    pub fn new(pool: SqlitePool, default_cost_per_gram: f64, simulate_when_offline: bool) -> Self {
        Self {
            pool,
            default_cost_per_gram,
            simulate_when_offline,
        }
    }

    /// Check required fields in order and derive cost and profit.
    pub async fn prepare(&self, submission: &SaleSubmission) -> Result<NewSale, SaleError> {
        let customer_name = required_text("customer_name", submission.customer_name.as_deref())?;
        let strain_name = required_text("strain_name", submission.strain_name.as_deref())?;
        let quantity_grams = required_amount("quantity_grams", submission.quantity_grams)?;
        let sale_price = required_amount("sale_price", submission.sale_price)?;

        let cost_price = match submission.cost_price {
            Some(cost) if cost.is_finite() && cost > 0.0 => cost,
            Some(cost) if !cost.is_finite() || cost < 0.0 => {
                return Err(SaleError::Validation(
                    "cost_price must be greater than 0".to_string(),
                ));
            }
            _ => quantity_grams * self.cost_per_gram(&strain_name).await,
        };

        let payment_method = submission
            .payment_method
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(|m| PaymentMethod::from_str(m).unwrap_or(PaymentMethod::Other))
            .unwrap_or_default();

        Ok(NewSale {
            customer_name,
            strain_name,
            quantity_grams,
            sale_price,
            cost_price,
            profit: sale_price - cost_price,
            payment_method,
            notes: submission
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        })
    }

    /// The strain's own cost when it is on file, otherwise the default.
    async fn cost_per_gram(&self, strain_name: &str) -> f64 {
        match Strain::find_by_name(&self.pool, strain_name).await {
            Ok(Some(strain)) => strain.cost_per_gram,
            Ok(None) => self.default_cost_per_gram,
            Err(e) => {
                warn!(error = %e, strain = %strain_name, "Strain lookup failed, using default cost");
                self.default_cost_per_gram
            }
        }
    }

    pub async fn record(&self, submission: &SaleSubmission) -> Result<RecordedSale, SaleError> {
        let new_sale = self.prepare(submission).await?;
        let id = Uuid::new_v4();

        match Sale::create(&self.pool, id, &new_sale).await {
            Ok(sale) => {
                info!(
                    sale_id = %sale.id,
                    customer = %sale.customer_name,
                    profit = sale.profit,
                    "Recorded sale"
                );
                Ok(RecordedSale {
                    sale,
                    simulated: false,
                })
            }
            Err(e) if self.simulate_when_offline => {
                warn!(error = %e, sale_id = %id, "Store unavailable, simulating sale");
                Ok(RecordedSale {
                    sale: Sale::simulated(id, &new_sale),
                    simulated: true,
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

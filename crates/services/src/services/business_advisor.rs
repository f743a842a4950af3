//! Business insights, customer classification and sale celebrations backed
//! by the language model. Every operation degrades instead of failing.

use std::{collections::HashSet, str::FromStr, sync::Arc};

use chrono::Utc;
use db::models::{
    customer::CustomerSummary,
    daily_profit::{self, DailyProfit},
    sale::Sale,
    strain::Strain,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sqlx::SqlitePool;
use strum_macros::{Display, EnumString};
use tracing::{debug, info, warn};
use ts_rs::TS;

use super::language_model::{ChatRequest, LanguageModel, LanguageModelError, complete_json};

const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 2000;

const INSIGHT_CUSTOMERS: i64 = 20;
const INSIGHT_DAYS: i64 = 30;
const RECENT_DAYS: usize = 7;
const PROMPT_TOP_CUSTOMERS: usize = 5;
pub const MAX_INSIGHTS: usize = 5;

const ANALYSIS_CUSTOMERS: i64 = 50;
pub const WHALE_PROFIT: f64 = 1000.0;
pub const VIP_PROFIT: f64 = 500.0;
pub const REGULAR_PROFIT: f64 = 100.0;
/// Customers quiet for longer than this are at risk.
pub const AT_RISK_DAYS: i64 = 30;
const DEFAULT_PRIORITY: u8 = 5;

const CELEBRATION_EMPTY: &str = "🎉 Nice sale! Keep the good vibes flowing! 🌿💚";
pub const CELEBRATION_FALLBACK: &str = "🎉 Awesome sale! Your empire grows stronger! 🌿💚";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum InsightType {
    Recommendation,
    Warning,
    Opportunity,
    Celebration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum InsightPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct BusinessInsight {
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub priority: InsightPriority,
    pub emoji: String,
}

impl BusinessInsight {
    /// Returned alone whenever insights cannot be generated.
    pub fn unavailable() -> Self {
        Self {
            insight_type: InsightType::Warning,
            title: "AI Analysis Unavailable".to_string(),
            message: "Unable to generate insights at this time. Please try again later."
                .to_string(),
            action: None,
            priority: InsightPriority::Low,
            emoji: "⚠️".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CustomerStatus {
    Whale,
    Vip,
    Regular,
    AtRisk,
    NewOpportunity,
}

impl CustomerStatus {
    /// Profit tiers first; below the regular tier recency decides between
    /// at-risk and new opportunity. An unknown last purchase counts as stale.
    pub fn classify(total_profit: f64, days_since_last_purchase: Option<i64>) -> Self {
        if total_profit >= WHALE_PROFIT {
            Self::Whale
        } else if total_profit >= VIP_PROFIT {
            Self::Vip
        } else if total_profit >= REGULAR_PROFIT {
            Self::Regular
        } else if days_since_last_purchase.is_none_or(|days| days > AT_RISK_DAYS) {
            Self::AtRisk
        } else {
            Self::NewOpportunity
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct CustomerAnalysis {
    pub customer_name: String,
    pub status: CustomerStatus,
    pub total_profit: f64,
    pub last_purchase_days: Option<i64>,
    pub recommendation: String,
    /// 1 (lowest) to 10 (highest).
    pub priority: u8,
}

/// The numbers an insight prompt is built from, computed locally.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightMetrics {
    pub customer_count: usize,
    pub top_customers: Vec<(String, f64)>,
    pub total_profit: f64,
    pub average_daily_profit: f64,
    pub last_7_days_profit: f64,
    pub strain_names: Vec<String>,
}

impl InsightMetrics {
    /// `daily` must be newest first.
    pub fn from_parts(customers: &[CustomerSummary], daily: &[DailyProfit], strains: &[Strain]) -> Self {
        let total_profit = daily_profit::total_profit(daily);
        let recent = &daily[..daily.len().min(RECENT_DAYS)];

        Self {
            customer_count: customers.len(),
            top_customers: customers
                .iter()
                .take(PROMPT_TOP_CUSTOMERS)
                .map(|c| (c.customer_name.clone(), c.total_profit))
                .collect(),
            total_profit,
            average_daily_profit: total_profit / daily.len().max(1) as f64,
            last_7_days_profit: daily_profit::total_profit(recent),
            strain_names: strains.iter().map(|s| s.name.clone()).collect(),
        }
    }

    fn to_prompt(&self) -> String {
        let top = self
            .top_customers
            .iter()
            .map(|(name, profit)| format!("{} (${:.2})", name, profit))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            r#"You are an AI business advisor for a cannabis business. Analyze the data and provide 3-5 actionable insights.

Business Data:
- Total customers: {count}
- Top customers: {top}
- 30-day total profit: ${total:.2}
- Average daily profit: ${average:.2}
- Last 7 days profit: ${recent:.2}
- Available strains: {strains}

Return JSON array of insights:
[{{
  "type": "recommendation|warning|opportunity|celebration",
  "title": "Short title",
  "message": "Detailed insight with specific numbers",
  "action": "Specific action to take",
  "priority": "low|medium|high",
  "emoji": "relevant emoji"
}}]

Focus on:
- Customer retention and re-engagement
- Profit optimization opportunities
- Inventory management
- Sales trends and patterns
- Growth opportunities"#,
            count = self.customer_count,
            top = top,
            total = self.total_profit,
            average = self.average_daily_profit,
            recent = self.last_7_days_profit,
            strains = self.strain_names.join(", "),
        )
    }
}

/// What the celebration message is written about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct SaleHighlights {
    pub customer_name: String,
    #[serde(default)]
    pub strain_name: Option<String>,
    pub quantity_grams: f64,
    pub sale_price: f64,
    pub profit: f64,
}

impl From<&Sale> for SaleHighlights {
    fn from(sale: &Sale) -> Self {
        Self {
            customer_name: sale.customer_name.clone(),
            strain_name: sale.strain_name.clone(),
            quantity_grams: sale.quantity_grams,
            sale_price: sale.sale_price,
            profit: sale.profit,
        }
    }
}

/// A JSON array, or an object wrapping one under `key`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListReply<T> {
    List(Vec<T>),
    Insights { insights: Vec<T> },
    Customers { customers: Vec<T> },
}

impl<T> ListReply<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::List(items) | Self::Insights { insights: items } | Self::Customers { customers: items } => items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ModelInsight {
    #[serde(rename = "type")]
    insight_type: Option<String>,
    title: Option<String>,
    message: Option<String>,
    action: Option<String>,
    priority: Option<String>,
    emoji: Option<String>,
}

impl ModelInsight {
    /// None when there is nothing to show.
    fn validate(self) -> Option<BusinessInsight> {
        let title = self.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
        let message = self.message.map(|m| m.trim().to_string()).filter(|m| !m.is_empty())?;

        Some(BusinessInsight {
            insight_type: self
                .insight_type
                .and_then(|t| InsightType::from_str(t.trim()).ok())
                .unwrap_or(InsightType::Recommendation),
            title,
            message,
            action: self.action.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()),
            priority: self
                .priority
                .and_then(|p| InsightPriority::from_str(p.trim()).ok())
                .unwrap_or(InsightPriority::Medium),
            emoji: self
                .emoji
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "💡".to_string()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ModelCustomerAnalysis {
    customer_name: String,
    recommendation: Option<String>,
    priority: Option<f64>,
}

fn clamp_priority(priority: Option<f64>) -> u8 {
    match priority {
        Some(p) if p.is_finite() => p.round().clamp(1.0, 10.0) as u8,
        _ => DEFAULT_PRIORITY,
    }
}

pub struct BusinessAdvisor {
    pool: SqlitePool,
    model: Arc<dyn LanguageModel>,
    advisor_model: String,
    celebration_model: String,
}

impl BusinessAdvisor {
    pub fn new(
        pool: SqlitePool,
        model: Arc<dyn LanguageModel>,
        advisor_model: impl Into<String>,
        celebration_model: impl Into<String>,
    ) -> Self {
        Self {
            pool,
            model,
            advisor_model: advisor_model.into(),
            celebration_model: celebration_model.into(),
        }
    }

    /// Between one and five insights. On any failure a single low-priority
    /// warning is returned instead.
    pub async fn generate_insights(&self) -> Vec<BusinessInsight> {
        match self.try_generate_insights().await {
            Ok(insights) => {
                info!(count = insights.len(), "Generated business insights");
                insights
            }
            Err(e) => {
                warn!(error = %e, "Business insights unavailable");
                vec![BusinessInsight::unavailable()]
            }
        }
    }

    pub async fn load_metrics(&self) -> Result<InsightMetrics, sqlx::Error> {
        let customers = CustomerSummary::top(&self.pool, INSIGHT_CUSTOMERS).await?;
        let daily = DailyProfit::last_days(&self.pool, INSIGHT_DAYS).await?;
        let strains = Strain::find_all(&self.pool).await?;
        Ok(InsightMetrics::from_parts(&customers, &daily, &strains))
    }

    async fn try_generate_insights(&self) -> Result<Vec<BusinessInsight>, AdvisorError> {
        let metrics = self.load_metrics().await?;
        let request = self.request(
            &self.advisor_model,
            metrics.to_prompt(),
            "Analyze my cannabis business and provide insights.",
        );

        let insights: Vec<BusinessInsight> = self
            .ask_list::<ModelInsight>(request)
            .await?
            .into_iter()
            .filter_map(ModelInsight::validate)
            .take(MAX_INSIGHTS)
            .collect();

        if insights.is_empty() {
            return Err(LanguageModelError::Schema("no usable insights".to_string()).into());
        }
        Ok(insights)
    }

    /// One entry per known customer the model commented on. Status, profit and
    /// recency come from the store; the model only contributes the
    /// recommendation and priority. Any failure yields an empty list.
    pub async fn analyze_customers(&self) -> Vec<CustomerAnalysis> {
        match self.try_analyze_customers().await {
            Ok(analysis) => {
                info!(count = analysis.len(), "Analyzed customer behavior");
                analysis
            }
            Err(e) => {
                warn!(error = %e, "Customer analysis unavailable");
                Vec::new()
            }
        }
    }

    async fn try_analyze_customers(&self) -> Result<Vec<CustomerAnalysis>, AdvisorError> {
        let customers = CustomerSummary::top(&self.pool, ANALYSIS_CUSTOMERS).await?;
        if customers.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let customer_data = customers
            .iter()
            .map(|c| {
                let recency = c
                    .days_since_last_purchase(now)
                    .map(|d| format!("last purchase {} days ago", d))
                    .unwrap_or_else(|| "last purchase unknown".to_string());
                format!(
                    "{}: ${:.2} profit, {} transactions, {}",
                    c.customer_name, c.total_profit, c.transaction_count, recency
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let request = self.request(
            &self.advisor_model,
            classification_prompt(),
            format!("Analyze these customers:\n{}", customer_data),
        );
        let entries = self.ask_list::<ModelCustomerAnalysis>(request).await?;

        let mut seen = HashSet::new();
        let analysis = entries
            .into_iter()
            .filter_map(|entry| {
                let Some(customer) = customers
                    .iter()
                    .find(|c| c.customer_name.eq_ignore_ascii_case(entry.customer_name.trim()))
                else {
                    debug!(customer = %entry.customer_name, "Dropping analysis for unknown customer");
                    return None;
                };
                if !seen.insert(customer.customer_name.clone()) {
                    return None;
                }

                let last_purchase_days = customer.days_since_last_purchase(now);
                Some(CustomerAnalysis {
                    customer_name: customer.customer_name.clone(),
                    status: CustomerStatus::classify(customer.total_profit, last_purchase_days),
                    total_profit: customer.total_profit,
                    last_purchase_days,
                    recommendation: entry
                        .recommendation
                        .map(|r| r.trim().to_string())
                        .unwrap_or_default(),
                    priority: clamp_priority(entry.priority),
                })
            })
            .collect();

        Ok(analysis)
    }

    /// A short upbeat message about a sale. Never fails.
    pub async fn celebrate_sale(&self, sale: &SaleHighlights) -> String {
        let system = format!(
            "You are a fun, enthusiastic AI assistant for a cannabis business. Generate a celebratory message for a successful sale.\n\n\
             Style: Stoner-casual, use emojis, keep it fun and positive. Mention specific details about the sale.\n\n\
             Sale details: Customer: {}, Strain: {}, Amount: {}g, Price: ${}, Profit: ${}\n\n\
             Generate a short, fun celebration message (2-3 sentences max).",
            sale.customer_name,
            sale.strain_name.as_deref().unwrap_or("unknown"),
            sale.quantity_grams,
            sale.sale_price,
            sale.profit,
        );
        let request = self.request(
            &self.celebration_model,
            system,
            "Generate a celebration message for this sale!",
        );

        match self.model.chat(request).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) | Err(LanguageModelError::EmptyResponse) => CELEBRATION_EMPTY.to_string(),
            Err(e) => {
                warn!(error = %e, "Celebration message unavailable");
                CELEBRATION_FALLBACK.to_string()
            }
        }
    }

    fn request(&self, model: &str, system: impl Into<String>, user: impl Into<String>) -> ChatRequest {
        ChatRequest::new(model, system, user)
            .with_temperature(TEMPERATURE)
            .with_max_tokens(MAX_TOKENS)
    }

    async fn ask_list<T: DeserializeOwned>(&self, request: ChatRequest) -> Result<Vec<T>, LanguageModelError> {
        let value: serde_json::Value = complete_json(self.model.as_ref(), request).await?;
        serde_json::from_value::<ListReply<T>>(value)
            .map(ListReply::into_vec)
            .map_err(|e| LanguageModelError::Schema(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
enum AdvisorError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("language model error: {0}")]
    LanguageModel(#[from] LanguageModelError),
}

fn classification_prompt() -> &'static str {
    r#"You are an AI customer behavior analyst for a cannabis business. Analyze customer data and classify each customer.

Customer Classifications:
- whale: $1000+ total profit, high value
- vip: $500-999 total profit, valuable
- regular: $100-499 total profit, steady
- at_risk: Haven't purchased recently, need re-engagement
- new_opportunity: Low profit but potential for growth

Return JSON array:
[{
  "customer_name": "name",
  "status": "classification",
  "total_profit": number,
  "last_purchase_days": estimated_days,
  "recommendation": "specific action to take",
  "priority": 1-10
}]"#
}

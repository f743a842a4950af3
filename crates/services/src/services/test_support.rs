use std::sync::Mutex;

use async_trait::async_trait;
use db::models::sale::{NewSale, PaymentMethod, Sale};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::language_model::{ChatRequest, LanguageModel, LanguageModelError};

/// Language model double that answers every call with the same reply and
/// records what it was asked.
pub struct ScriptedModel {
    reply: Result<String, LanguageModelError>,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: LanguageModelError) -> Self {
        Self {
            reply: Err(error),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> ChatRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn chat(&self, request: ChatRequest) -> Result<String, LanguageModelError> {
        self.requests.lock().unwrap().push(request);
        self.reply.clone()
    }
}

pub async fn record_sale(pool: &SqlitePool, customer: &str, price: f64, profit: f64) -> Sale {
    Sale::create(
        pool,
        Uuid::new_v4(),
        &NewSale {
            customer_name: customer.to_string(),
            strain_name: "Stardust".to_string(),
            quantity_grams: 3.5,
            sale_price: price,
            cost_price: price - profit,
            profit,
            payment_method: PaymentMethod::Cash,
            notes: None,
        },
    )
    .await
    .unwrap()
}

/// Move a sale into the past so recency rules can be exercised.
pub async fn backdate_sale(pool: &SqlitePool, id: Uuid, days_ago: i64) {
    sqlx::query("UPDATE sales SET created_at = datetime('now', '-' || $1 || ' days') WHERE id = $2")
        .bind(days_ago)
        .bind(id)
        .execute(pool)
        .await
        .unwrap();
}

//! Natural-language sale parsing: quick parse, then the language model, with a
//! local fallback and one audit row per model-backed attempt.

use std::{str::FromStr, sync::Arc};

use db::models::{
    ai_parsing_log::{AiParsingLog, CreateAiParsingLog, ParseStatus},
    customer::CustomerSummary,
    parsed_sale::ParsedSale,
    sale::PaymentMethod,
    strain::Strain,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use super::{
    language_model::{ChatRequest, LanguageModel, LanguageModelError, complete_json},
    quick_sale::{is_confident, parse_quick_sale},
    sale_extractors::fill_missing,
};

/// Model answers at or below this confidence are flagged for manual review.
pub const SUCCESS_CONFIDENCE: f64 = 0.7;

const TEMPERATURE: f32 = 0.1;
const MAX_TOKENS: u32 = 1000;
const OFFLINE_HINT: &str = "Strain, quantity or payment filled in offline - please confirm";

/// Raw model output. Everything is optional so that partial answers still
/// validate; unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct ModelSale {
    customer_name: Option<String>,
    strain_name: Option<String>,
    quantity_grams: Option<f64>,
    sale_price: Option<f64>,
    payment_method: Option<String>,
    confidence: Option<f64>,
    suggestions: Option<Vec<String>>,
}

impl ModelSale {
    fn into_parsed(self) -> ParsedSale {
        let positive = |v: Option<f64>| v.filter(|v| v.is_finite() && *v > 0.0);
        let payment_method = match self.payment_method.as_deref().map(str::trim) {
            None | Some("") => PaymentMethod::Cash,
            Some(raw) => PaymentMethod::from_str(raw).unwrap_or(PaymentMethod::Other),
        };

        ParsedSale {
            customer_name: self.customer_name.unwrap_or_default().trim().to_string(),
            strain_name: self
                .strain_name
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            quantity_grams: positive(self.quantity_grams),
            sale_price: positive(self.sale_price),
            payment_method: Some(payment_method),
            confidence: self.confidence.unwrap_or(0.0).clamp(0.0, 1.0),
            suggestions: self.suggestions.unwrap_or_default(),
        }
    }
}

/// Names the prompt is grounded on.
#[derive(Debug, Default)]
struct ParseContext {
    customers: Vec<String>,
    strains: Vec<String>,
}

pub struct SaleParser {
    pool: SqlitePool,
    model: Arc<dyn LanguageModel>,
    default_model: String,
}

impl SaleParser {
    pub fn new(pool: SqlitePool, model: Arc<dyn LanguageModel>, default_model: impl Into<String>) -> Self {
        Self {
            pool,
            model,
            default_model: default_model.into(),
        }
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Quick parse first; the language model is only consulted when the quick
    /// parse is not confident enough.
    pub async fn parse(&self, input: &str, model: Option<&str>) -> ParsedSale {
        let quick = parse_quick_sale(input);
        if is_confident(&quick) {
            debug!(confidence = quick.confidence, "Quick sale parse accepted");
            return quick;
        }

        let model = model
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.default_model);
        self.parse_natural_language(input, model).await
    }

    /// Ask the language model to structure `input`. Never fails: any remote or
    /// validation error falls back to the quick parser. Exactly one audit row
    /// is attempted per call.
    pub async fn parse_natural_language(&self, input: &str, model: &str) -> ParsedSale {
        let context = self.load_context().await;

        match self.parse_remote(input, model, &context).await {
            Ok(parsed) => {
                let status = if parsed.confidence > SUCCESS_CONFIDENCE {
                    ParseStatus::Success
                } else {
                    ParseStatus::ManualReview
                };
                info!(
                    model = %model,
                    confidence = parsed.confidence,
                    status = %status,
                    "Parsed sale with language model"
                );
                self.audit(input, &parsed, status, Some(model), None).await;
                parsed
            }
            Err(e) => {
                warn!(model = %model, error = %e, "Language model parse failed, using quick parser");
                let parsed = fallback_parse(input, &context.strains);
                let message = e.to_string();
                self.audit(input, &parsed, ParseStatus::FallbackUsed, None, Some(&message))
                    .await;
                parsed
            }
        }
    }

    async fn parse_remote(
        &self,
        input: &str,
        model: &str,
        context: &ParseContext,
    ) -> Result<ParsedSale, LanguageModelError> {
        let system = build_system_prompt(&context.customers, &context.strains);
        debug!(prompt_chars = system.len(), "Built sale parsing prompt");

        let request = ChatRequest::new(model, system, format!("Parse this sale: \"{}\"", input))
            .with_temperature(TEMPERATURE)
            .with_max_tokens(MAX_TOKENS);

        let value: serde_json::Value = complete_json(self.model.as_ref(), request).await?;
        let raw: ModelSale =
            serde_json::from_value(value).map_err(|e| LanguageModelError::Schema(e.to_string()))?;

        Ok(raw.into_parsed())
    }

    async fn load_context(&self) -> ParseContext {
        let customers = match CustomerSummary::search(&self.pool, "").await {
            Ok(rows) => rows.into_iter().map(|c| c.customer_name).collect(),
            Err(e) => {
                warn!(error = %e, "Could not load customers for parse prompt");
                Vec::new()
            }
        };
        let strains = match Strain::find_all(&self.pool).await {
            Ok(rows) => rows.into_iter().map(|s| s.name).collect(),
            Err(e) => {
                warn!(error = %e, "Could not load strains for parse prompt");
                Vec::new()
            }
        };
        ParseContext { customers, strains }
    }

    async fn audit(
        &self,
        input: &str,
        parsed: &ParsedSale,
        status: ParseStatus,
        model_used: Option<&str>,
        error_message: Option<&str>,
    ) {
        let entry = CreateAiParsingLog {
            input_text: input,
            parsed,
            status,
            model_used,
            error_message,
        };
        if let Err(e) = AiParsingLog::create(&self.pool, &entry).await {
            warn!(error = %e, status = %status, "Failed to write parse audit log");
        }
    }
}

/// Quick parse, with the fields it cannot see filled in by local heuristics.
/// Name, price and confidence are always exactly the quick parse's.
pub fn fallback_parse(input: &str, known_strains: &[String]) -> ParsedSale {
    let mut parsed = parse_quick_sale(input);
    if fill_missing(&mut parsed, input, known_strains) {
        parsed.suggestions.push(OFFLINE_HINT.to_string());
    }
    parsed
}

fn build_system_prompt(customers: &[String], strains: &[String]) -> String {
    format!(
        r#"You are an AI assistant for a cannabis business tracker. Parse sales input and extract structured data.

Available customers: {customers}
Available strains: {strains}

Weight conversions:
- 1 oz = 28g
- 1 eighth = 3.5g
- 1 quarter = 7g
- 1 half = 14g
- 1 lb = 448g

Strain aliases:
- GSC = Girl Scout Cookies
- Cookies = Girl Scout Cookies
- Purple = Purple Chem
- Candy = Candyland
- Dust = Stardust

Return JSON with:
{{
  "customer_name": "exact customer name or best match",
  "strain_name": "exact strain name or null",
  "quantity_grams": number or null,
  "sale_price": number or null,
  "payment_method": "cash|card|crypto|other",
  "confidence": 0.0-1.0,
  "suggestions": ["array of helpful suggestions"]
}}"#,
        customers = customers.join(", "),
        strains = strains.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use db::DBService;

    use super::*;
    use crate::services::test_support::{ScriptedModel, record_sale};

    async fn parser_with(model: Arc<ScriptedModel>) -> (DBService, SaleParser) {
        let db = DBService::new_in_memory().await.unwrap();
        let parser = SaleParser::new(db.pool.clone(), model, "openai/gpt-4o-mini");
        (db, parser)
    }

    #[tokio::test]
    async fn confidence_above_one_is_clamped_and_logged_as_success() {
        let model = Arc::new(ScriptedModel::replying(
            r#"{"customer_name":"Jay","strain_name":"Stardust","quantity_grams":7,"sale_price":120,"payment_method":"card","confidence":1.5}"#,
        ));
        let (db, parser) = parser_with(model).await;

        let parsed = parser
            .parse_natural_language("jay quarter of dust 120 card", "openai/gpt-4o-mini")
            .await;

        assert_eq!(parsed.confidence, 1.0);
        assert_eq!(parsed.customer_name, "Jay");
        assert_eq!(parsed.quantity_grams, Some(7.0));
        assert_eq!(parsed.payment_method, Some(PaymentMethod::Card));
        assert!(parsed.suggestions.is_empty());

        let logs = AiParsingLog::find_recent(&db.pool, 10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, ParseStatus::Success);
        assert_eq!(logs[0].model_used.as_deref(), Some("openai/gpt-4o-mini"));
        assert_eq!(logs[0].parsed(), Some(parsed));
    }

    #[tokio::test]
    async fn negative_confidence_is_clamped_to_zero_for_manual_review() {
        let model = Arc::new(ScriptedModel::replying(
            "```json\n{\"customer_name\":\"Jay\",\"confidence\":-0.2,\"extra\":true}\n```",
        ));
        let (db, parser) = parser_with(model).await;

        let parsed = parser.parse_natural_language("jay something", "m").await;

        assert_eq!(parsed.confidence, 0.0);
        assert_eq!(parsed.payment_method, Some(PaymentMethod::Cash));
        let logs = AiParsingLog::find_recent(&db.pool, 10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, ParseStatus::ManualReview);
    }

    #[tokio::test]
    async fn confidence_at_threshold_needs_review() {
        let model = Arc::new(ScriptedModel::replying(r#"{"customer_name":"Jay","confidence":0.7}"#));
        let (db, parser) = parser_with(model).await;

        parser.parse_natural_language("jay", "m").await;

        let logs = AiParsingLog::find_recent(&db.pool, 1).await.unwrap();
        assert_eq!(logs[0].status, ParseStatus::ManualReview);
    }

    #[tokio::test]
    async fn invalid_fields_are_normalized() {
        let model = Arc::new(ScriptedModel::replying(
            r#"{"customer_name":"  Mike ","strain_name":" ","quantity_grams":-3,"sale_price":0,"payment_method":"Venmo","confidence":0.9}"#,
        ));
        let (_db, parser) = parser_with(model).await;

        let parsed = parser.parse_natural_language("mike", "m").await;

        assert_eq!(parsed.customer_name, "Mike");
        assert_eq!(parsed.strain_name, None);
        assert_eq!(parsed.quantity_grams, None);
        assert_eq!(parsed.sale_price, None);
        assert_eq!(parsed.payment_method, Some(PaymentMethod::Other));
    }

    #[tokio::test]
    async fn remote_failure_falls_back_to_quick_parse() {
        let model = Arc::new(ScriptedModel::failing(LanguageModelError::Http {
            status: 502,
            body: "bad gateway".into(),
        }));
        let (db, parser) = parser_with(model).await;

        let parsed = parser.parse_natural_language("Jay 325", "m").await;
        let quick = parse_quick_sale("Jay 325");

        assert_eq!(parsed.customer_name, quick.customer_name);
        assert_eq!(parsed.sale_price, quick.sale_price);
        assert_eq!(parsed.confidence, quick.confidence);

        let logs = AiParsingLog::find_recent(&db.pool, 10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, ParseStatus::FallbackUsed);
        assert_eq!(logs[0].model_used, None);
        assert!(logs[0].error_message.as_deref().unwrap().contains("502"));
    }

    #[tokio::test]
    async fn wrong_shape_is_a_schema_failure() {
        for reply in [r#"{"confidence":"high"}"#, "[1, 2]", "not json at all"] {
            let model = Arc::new(ScriptedModel::replying(reply));
            let (db, parser) = parser_with(model).await;

            let parsed = parser.parse_natural_language("Jay 325", "m").await;

            assert_eq!(parsed.confidence, 0.8, "{reply}");
            let logs = AiParsingLog::find_recent(&db.pool, 10).await.unwrap();
            assert_eq!(logs[0].status, ParseStatus::FallbackUsed, "{reply}");
        }
    }

    #[tokio::test]
    async fn fallback_fills_missing_fields_from_heuristics() {
        let model = Arc::new(ScriptedModel::failing(LanguageModelError::Timeout));
        let (_db, parser) = parser_with(model).await;

        let parsed = parser
            .parse_natural_language("jay 325 quarter of gsc crypto", "m")
            .await;

        assert_eq!(parsed.customer_name, "Jay");
        assert_eq!(parsed.sale_price, Some(325.0));
        assert_eq!(parsed.confidence, 0.8);
        assert_eq!(parsed.strain_name.as_deref(), Some("Girl Scout Cookies"));
        assert_eq!(parsed.quantity_grams, Some(7.0));
        assert_eq!(parsed.payment_method, Some(PaymentMethod::Crypto));
        assert!(parsed.suggestions.iter().any(|s| s == OFFLINE_HINT));
    }

    #[tokio::test]
    async fn prompt_lists_known_customers_and_strains() {
        let model = Arc::new(ScriptedModel::replying(r#"{"customer_name":"Trife","confidence":0.9}"#));
        let (db, parser) = parser_with(model.clone()).await;
        record_sale(&db.pool, "Trife", 300.0, 150.0).await;

        parser.parse_natural_language("trife 300", "openai/gpt-4o").await;

        let request = model.last_request();
        assert_eq!(request.model, "openai/gpt-4o");
        assert_eq!(request.temperature, 0.1);
        assert_eq!(request.max_tokens, 1000);
        let system = &request.messages[0].content;
        assert!(system.contains("Available customers: Trife"));
        assert!(system.contains("Purple Chem"));
        assert!(system.contains("1 lb = 448g"));
        assert_eq!(request.messages[1].content, "Parse this sale: \"trife 300\"");
    }

    #[tokio::test]
    async fn quick_parse_at_threshold_still_consults_model() {
        let model = Arc::new(ScriptedModel::replying(r#"{"customer_name":"Jay","confidence":0.95}"#));
        let (_db, parser) = parser_with(model.clone()).await;

        let parsed = parser.parse("Jay 325", None).await;

        assert_eq!(model.calls(), 1);
        assert_eq!(model.last_request().model, "openai/gpt-4o-mini");
        assert_eq!(parsed.confidence, 0.95);
    }

    #[tokio::test]
    async fn unreachable_store_still_returns_a_result() {
        let model = Arc::new(ScriptedModel::replying(r#"{"customer_name":"Jay","confidence":0.9}"#));
        let (db, parser) = parser_with(model.clone()).await;
        db.pool.close().await;

        let parsed = parser.parse_natural_language("jay", "m").await;

        assert_eq!(parsed.customer_name, "Jay");
        assert!(model.last_request().messages[0].content.contains("Available customers: \n"));
    }
}

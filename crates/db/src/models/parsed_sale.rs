use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::sale::PaymentMethod;

/// Candidate sale extracted from free text. Never the system of record: it is
/// shown to the user for confirmation and serialized into the parse audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ParsedSale {
    pub customer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strain_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_grams: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    /// Always within [0, 1].
    pub confidence: f64,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl ParsedSale {
    /// A result carrying no extracted fields.
    pub fn unparsed(suggestion: impl Into<String>) -> Self {
        Self {
            customer_name: String::new(),
            strain_name: None,
            quantity_grams: None,
            sale_price: None,
            payment_method: None,
            confidence: 0.0,
            suggestions: vec![suggestion.into()],
        }
    }
}

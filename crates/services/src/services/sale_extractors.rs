//! Local, low-confidence heuristics for pulling sale fields out of free text.
//!
//! Every extractor is case-insensitive and first-match-wins over a pattern
//! list ordered from most to least specific.

use db::models::{parsed_sale::ParsedSale, sale::PaymentMethod};
use once_cell::sync::Lazy;
use regex::Regex;

use super::quick_sale::capitalize_words;

/// Grams per unit.
pub const WEIGHT_CONVERSIONS: &[(&str, f64)] = &[
    ("g", 1.0),
    ("gram", 1.0),
    ("grams", 1.0),
    ("oz", 28.0),
    ("ounce", 28.0),
    ("ounces", 28.0),
    ("eighth", 3.5),
    ("8th", 3.5),
    ("quarter", 7.0),
    ("q", 7.0),
    ("half", 14.0),
    ("lb", 448.0),
    ("lbs", 448.0),
    ("pound", 448.0),
    ("pounds", 448.0),
];

/// Shorthand customers use for the house strains.
pub const STRAIN_ALIASES: &[(&str, &str)] = &[
    ("gsc", "Girl Scout Cookies"),
    ("cookies", "Girl Scout Cookies"),
    ("purple", "Purple Chem"),
    ("candy", "Candyland"),
    ("star", "Stardust"),
    ("dust", "Stardust"),
];

const NAME_CONFIDENCE: f64 = 0.3;
const STRAIN_CONFIDENCE: f64 = 0.3;
const STRAIN_ALIAS_CONFIDENCE: f64 = 0.2;
const QUANTITY_CONFIDENCE: f64 = 0.3;
const PRICE_CONFIDENCE: f64 = 0.2;
const PAYMENT_CONFIDENCE: f64 = 0.1;

const MIN_PRICE: f64 = 10.0;
const MAX_PRICE: f64 = 10_000.0;

/// A value pulled out of text along with how much it should be trusted.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted<T> {
    pub value: T,
    pub confidence: f64,
}

impl<T> Extracted<T> {
    fn new(value: T, confidence: f64) -> Self {
        Self { value, confidence }
    }
}

static NAME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(?:sold to|to)\s+([a-z\s]+?)(?:\s|$|\d)",
        r"(?i)^([a-z\s]+?)\s+(?:bought|got|purchased)",
        r"(?i)^([a-z\s]+?)\s+\$?\d",
        r"(?i)^([a-z\s]+?)\s+\d",
        r"(?i)^([a-z\s]+?)(?:\s|$)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static UNIT_QUANTITY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(\d+(?:\.\d+)?)\s*(ounces|ounce|oz)\b",
        r"(?i)(\d+(?:\.\d+)?)\s*(grams|gram|g)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static NAMED_QUANTITY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"(?i)\b(eighth|8th)\b", r"(?i)\b(quarter|q)\b", r"(?i)\b(half)\b"]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

static POUND_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(pounds|pound|lbs|lb)\b").unwrap());

static PRICE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\$(\d+(?:\.\d{2})?)",
        r"(?i)(?:paid|cost|price|for)\s*\$?(\d+(?:\.\d{2})?)",
        r"(?i)(\d+(?:\.\d{2})?)\s*(?:dollars?|bucks?)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static BARE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{2,4}(?:\.\d{2})?)\b").unwrap());

static LEADING_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:ounces|ounce|oz|grams|gram|g|pounds|pound|lbs|lb)\b").unwrap()
});

fn grams_per(unit: &str) -> Option<f64> {
    let unit = unit.to_ascii_lowercase();
    WEIGHT_CONVERSIONS
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|(_, grams)| *grams)
}

/// Customer name from "sold to X", "X bought ...", "X 325" or a leading word.
pub fn extract_customer_name(input: &str) -> Option<Extracted<String>> {
    let input = input.trim();
    NAME_PATTERNS.iter().find_map(|pattern| {
        let name = pattern.captures(input)?.get(1)?.as_str().trim();
        (name.len() > 1 && name.len() < 50)
            .then(|| Extracted::new(capitalize_words(name), NAME_CONFIDENCE))
    })
}

/// A known strain named verbatim, or failing that a known alias.
pub fn extract_strain_name(input: &str, known_strains: &[String]) -> Option<Extracted<String>> {
    let lowered = input.to_lowercase();

    if let Some(strain) = known_strains
        .iter()
        .find(|s| !s.is_empty() && lowered.contains(&s.to_lowercase()))
    {
        return Some(Extracted::new(strain.clone(), STRAIN_CONFIDENCE));
    }

    STRAIN_ALIASES
        .iter()
        .find(|(alias, _)| lowered.contains(alias))
        .map(|(_, full)| Extracted::new((*full).to_string(), STRAIN_ALIAS_CONFIDENCE))
}

/// Quantity in grams from "1 oz", "3.5g", "eighth", "quarter", "half", "1 lb".
pub fn extract_quantity(input: &str) -> Option<Extracted<f64>> {
    let numeric = |pattern: &Regex| -> Option<f64> {
        let caps = pattern.captures(input)?;
        let amount: f64 = caps.get(1)?.as_str().parse().ok()?;
        Some(amount * grams_per(caps.get(2)?.as_str())?)
    };
    let named = |pattern: &Regex| -> Option<f64> {
        grams_per(pattern.captures(input)?.get(1)?.as_str())
    };

    UNIT_QUANTITY_PATTERNS
        .iter()
        .find_map(numeric)
        .or_else(|| NAMED_QUANTITY_PATTERNS.iter().find_map(named))
        .or_else(|| numeric(&*POUND_PATTERN))
        .filter(|grams| *grams > 0.0)
        .map(|grams| Extracted::new(grams, QUANTITY_CONFIDENCE))
}

/// Price from "$325", "paid 325", "325 bucks" or a bare 2-4 digit number.
/// Only values strictly between 10 and 10000 are accepted.
pub fn extract_price(input: &str) -> Option<Extracted<f64>> {
    let in_range = |price: f64| price > MIN_PRICE && price < MAX_PRICE;

    let labelled = PRICE_PATTERNS.iter().find_map(|pattern| {
        let price: f64 = pattern.captures(input)?.get(1)?.as_str().parse().ok()?;
        in_range(price).then_some(price)
    });

    // A bare number directly followed by a weight unit is a quantity.
    let bare = || {
        BARE_NUMBER
            .captures_iter(input)
            .filter_map(|caps| caps.get(1))
            .filter(|m| !LEADING_UNIT.is_match(&input[m.end()..]))
            .find_map(|m| m.as_str().parse::<f64>().ok())
            .filter(|price| in_range(*price))
    };

    labelled
        .or_else(bare)
        .map(|price| Extracted::new(price, PRICE_CONFIDENCE))
}

pub fn extract_payment_method(input: &str) -> Option<Extracted<PaymentMethod>> {
    let lowered = input.to_lowercase();
    let method = if lowered.contains("cash") {
        PaymentMethod::Cash
    } else if lowered.contains("card") || lowered.contains("credit") {
        PaymentMethod::Card
    } else if lowered.contains("crypto") || lowered.contains("bitcoin") {
        PaymentMethod::Crypto
    } else {
        return None;
    };
    Some(Extracted::new(method, PAYMENT_CONFIDENCE))
}

/// Run every extractor and combine the hits into one candidate. Confidence is
/// the sum of the individual contributions, capped at 1.
pub fn extract_sale(input: &str, known_strains: &[String]) -> ParsedSale {
    let name = extract_customer_name(input);
    let strain = extract_strain_name(input, known_strains);
    let quantity = extract_quantity(input);
    let price = extract_price(input);
    let payment = extract_payment_method(input);

    let confidence = [
        name.as_ref().map(|e| e.confidence),
        strain.as_ref().map(|e| e.confidence),
        quantity.as_ref().map(|e| e.confidence),
        price.as_ref().map(|e| e.confidence),
        payment.as_ref().map(|e| e.confidence),
    ]
    .into_iter()
    .flatten()
    .sum::<f64>()
    .min(1.0);

    let mut suggestions = Vec::new();
    if strain.is_none() {
        suggestions.push("Could not identify strain - please select one".to_string());
    }
    if quantity.is_none() {
        suggestions.push("Could not identify quantity - please enter grams".to_string());
    }
    if price.is_none() {
        suggestions.push("Could not identify price - please enter the sale amount".to_string());
    }

    ParsedSale {
        customer_name: name.map(|e| e.value).unwrap_or_default(),
        strain_name: strain.map(|e| e.value),
        quantity_grams: quantity.map(|e| e.value),
        sale_price: price.map(|e| e.value),
        payment_method: payment.map(|e| e.value),
        confidence,
        suggestions,
    }
}

/// Fill the fields `parsed` left empty (strain, quantity, payment method)
/// from local heuristics. Fields already present are never touched, and
/// neither are name, price or confidence. Returns whether anything was added.
pub fn fill_missing(parsed: &mut ParsedSale, input: &str, known_strains: &[String]) -> bool {
    let mut filled = false;

    if parsed.strain_name.is_none() {
        if let Some(strain) = extract_strain_name(input, known_strains) {
            parsed.strain_name = Some(strain.value);
            filled = true;
        }
    }
    if parsed.quantity_grams.is_none() {
        if let Some(quantity) = extract_quantity(input) {
            parsed.quantity_grams = Some(quantity.value);
            filled = true;
        }
    }
    if parsed.payment_method.is_none() {
        if let Some(payment) = extract_payment_method(input) {
            parsed.payment_method = Some(payment.value);
            filled = true;
        }
    }

    filled
}

#[cfg(test)]
mod tests {
    use super::*;

    fn house_strains() -> Vec<String> {
        ["Girl Scout Cookies", "Purple Chem", "Stardust", "Candyland"]
            .map(String::from)
            .to_vec()
    }

    #[test]
    fn customer_name_patterns_in_order() {
        assert_eq!(extract_customer_name("sold to mike 3.5g").unwrap().value, "Mike");
        assert_eq!(
            extract_customer_name("big tony bought a quarter").unwrap().value,
            "Big Tony"
        );
        assert_eq!(extract_customer_name("jay $325").unwrap().value, "Jay");
        assert_eq!(extract_customer_name("trife").unwrap().value, "Trife");
        assert!(extract_customer_name("x").is_none());
        assert!(extract_customer_name("325").is_none());
    }

    #[test]
    fn strain_exact_beats_alias() {
        let strains = house_strains();

        let exact = extract_strain_name("quarter of PURPLE CHEM", &strains).unwrap();
        assert_eq!(exact.value, "Purple Chem");
        assert_eq!(exact.confidence, 0.3);

        let alias = extract_strain_name("jay gsc 120", &strains).unwrap();
        assert_eq!(alias.value, "Girl Scout Cookies");
        assert_eq!(alias.confidence, 0.2);

        assert_eq!(
            extract_strain_name("some dust", &[]).unwrap().value,
            "Stardust"
        );
        assert!(extract_strain_name("jay 120", &strains).is_none());
    }

    #[test]
    fn quantity_units() {
        let grams = |s: &str| extract_quantity(s).map(|e| e.value);

        assert_eq!(grams("1 oz of gsc"), Some(28.0));
        assert_eq!(grams("2 ounces"), Some(56.0));
        assert_eq!(grams("3.5g"), Some(3.5));
        assert_eq!(grams("an eighth"), Some(3.5));
        assert_eq!(grams("a QUARTER"), Some(7.0));
        assert_eq!(grams("half"), Some(14.0));
        assert_eq!(grams("1 lb"), Some(448.0));
        assert_eq!(grams("jay 325"), None);
        assert_eq!(grams("jay 325 got it"), None);
    }

    #[test]
    fn price_patterns_and_range() {
        let price = |s: &str| extract_price(s).map(|e| e.value);

        assert_eq!(price("jay $325"), Some(325.0));
        assert_eq!(price("3.5g paid 60"), Some(60.0));
        assert_eq!(price("eighth 45 bucks"), Some(45.0));
        assert_eq!(price("mike quarter 120"), Some(120.0));
        assert_eq!(price("mike 28g 300"), Some(300.0));
        assert_eq!(price("mike 5"), None);
        assert_eq!(price("$20000"), None);
    }

    #[test]
    fn payment_methods() {
        let method = |s: &str| extract_payment_method(s).map(|e| e.value);

        assert_eq!(method("paid CASH"), Some(PaymentMethod::Cash));
        assert_eq!(method("on credit"), Some(PaymentMethod::Card));
        assert_eq!(method("bitcoin"), Some(PaymentMethod::Crypto));
        assert_eq!(method("venmo"), None);
    }

    #[test]
    fn full_heuristic_parse() {
        let parsed = extract_sale("sold to mike a quarter of gsc for $120 cash", &house_strains());

        assert_eq!(parsed.customer_name, "Mike");
        assert_eq!(parsed.strain_name.as_deref(), Some("Girl Scout Cookies"));
        assert_eq!(parsed.quantity_grams, Some(7.0));
        assert_eq!(parsed.sale_price, Some(120.0));
        assert_eq!(parsed.payment_method, Some(PaymentMethod::Cash));
        assert!((parsed.confidence - 1.0).abs() < 1e-9);
        assert!(parsed.suggestions.is_empty());
    }

    #[test]
    fn fill_missing_keeps_existing_fields() {
        let mut parsed = ParsedSale {
            customer_name: "Jay".into(),
            strain_name: Some("Stardust".into()),
            quantity_grams: None,
            sale_price: Some(325.0),
            payment_method: None,
            confidence: 0.8,
            suggestions: vec![],
        };

        let filled = fill_missing(&mut parsed, "jay 325 gsc half card", &house_strains());

        assert!(filled);
        assert_eq!(parsed.strain_name.as_deref(), Some("Stardust"));
        assert_eq!(parsed.quantity_grams, Some(14.0));
        assert_eq!(parsed.payment_method, Some(PaymentMethod::Card));
        assert_eq!(parsed.sale_price, Some(325.0));
        assert_eq!(parsed.confidence, 0.8);
    }
}

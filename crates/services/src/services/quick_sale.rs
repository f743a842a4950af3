//! Fast path for terse sale entries like `"Jay 325"`.

use db::models::parsed_sale::ParsedSale;

/// Confidence assigned to a successful quick parse.
pub const QUICK_SALE_CONFIDENCE: f64 = 0.8;

/// The remote parser is skipped only when the quick parse scores strictly above this.
pub const QUICK_SALE_THRESHOLD: f64 = 0.8;

const QUICK_SALE_HINT: &str = "Quick sale format detected - please add strain and quantity details";
const QUICK_SALE_FAILED: &str = "Could not parse quick sale format";

/// Parse `<name> <price>`: first token is the customer, second a positive price.
/// Anything after the second token is ignored.
pub fn parse_quick_sale(input: &str) -> ParsedSale {
    let mut parts = input.split_whitespace();

    let (Some(name), Some(amount)) = (parts.next(), parts.next()) else {
        return ParsedSale::unparsed(QUICK_SALE_FAILED);
    };
    let Some(price) = parse_price_token(amount) else {
        return ParsedSale::unparsed(QUICK_SALE_FAILED);
    };

    ParsedSale {
        customer_name: capitalize_words(name),
        strain_name: None,
        quantity_grams: None,
        sale_price: Some(price),
        payment_method: None,
        confidence: QUICK_SALE_CONFIDENCE,
        suggestions: vec![QUICK_SALE_HINT.to_string()],
    }
}

/// True when the quick parse is good enough to skip the language model.
pub fn is_confident(parsed: &ParsedSale) -> bool {
    parsed.confidence > QUICK_SALE_THRESHOLD
}

fn parse_price_token(token: &str) -> Option<f64> {
    let token = token.strip_prefix('$').unwrap_or(token);
    token
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite() && *price > 0.0)
}

/// Upper-case the first character of every word.
pub fn capitalize_words(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_word = false;
    for c in s.chars() {
        let is_word = c.is_alphanumeric() || c == '_';
        if is_word && !prev_is_word {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        prev_is_word = is_word;
    }
    out
}

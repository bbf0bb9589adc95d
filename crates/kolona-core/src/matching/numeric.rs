use rust_decimal::Decimal;
use std::str::FromStr;

/// A whitespace-delimited piece of a line, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Numeric(Decimal),
    Text(String),
}

impl Token {
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Token::Numeric(v) => Some(*v),
            Token::Text(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Token::Numeric(_))
    }
}

/// Classify a token as a number or text.
///
/// Handles formats like:
/// - "2,50" -> Numeric(2.50) (decimal comma)
/// - "2.50" -> Numeric(2.50)
/// - "-3" -> Numeric(-3)
/// - "1e3" -> Numeric(1000)
/// - "1.234,56" -> Text (two separators after normalization)
/// - "лв." -> Text
pub fn classify(token: &str) -> Token {
    match parse_number(token) {
        Some(v) => Token::Numeric(v),
        None => Token::Text(token.to_string()),
    }
}

/// Parse a number, treating "," as the decimal separator.
pub fn parse_number(token: &str) -> Option<Decimal> {
    let s = token.trim();
    if s.is_empty() {
        return None;
    }
    let normalized = s.replace(',', ".");
    if let Ok(v) = Decimal::from_str(&normalized) {
        return Some(v);
    }
    if normalized.contains(['e', 'E']) {
        return Decimal::from_scientific(&normalized).ok();
    }
    None
}

/// True for tokens like "12,50" or "0.10": digits, one separator, exactly
/// two fractional digits.
pub fn is_two_place_decimal(token: &str) -> bool {
    let Some((int_part, frac_part)) = token.split_once(['.', ',']) else {
        return false;
    };
    !int_part.is_empty()
        && int_part.bytes().all(|b| b.is_ascii_digit())
        && frac_part.len() == 2
        && frac_part.bytes().all(|b| b.is_ascii_digit())
}

//! Value normalisation shared by every extractor.
//!
//! Parsing never invents values: anything that fails to parse is `None`,
//! never zero.

use lp_watch_domain::{Percentage, PriceBounds, RangeStatus};
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses a plain number, ignoring thousands separators and a leading `+`.
pub fn parse_number(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    let cleaned = cleaned.trim_start_matches('+').trim_end_matches('.');
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(cleaned).ok()
}

/// Parses a USD amount such as `$1,234.56`, `~$16.02` or `$16K`.
pub fn parse_currency(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim().trim_start_matches(['~', '≈']).trim_start();
    let body = trimmed.replacen('$', "", 1);
    let body = body.trim();
    match body.strip_suffix(['K', 'k']) {
        Some(thousands) => parse_number(thousands)?.checked_mul(Decimal::ONE_THOUSAND),
        None => parse_number(body),
    }
}

/// Parses a percentage such as `12.5%` into points.
pub fn parse_percent(raw: &str) -> Option<Decimal> {
    parse_number(raw.trim().trim_end_matches('%'))
}

/// First capture group of the first match.
pub fn capture_text<'t>(pattern: &Regex, text: &'t str) -> Option<&'t str> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// First capture group of the first match, parsed as a number.
pub fn capture_number(pattern: &Regex, text: &str) -> Option<Decimal> {
    capture_text(pattern, text).and_then(parse_number)
}

/// Groups 1 and 2 of the first match, parsed as numbers.
pub fn capture_number_pair(pattern: &Regex, text: &str) -> Option<(Decimal, Decimal)> {
    let caps = pattern.captures(text)?;
    let first = parse_number(caps.get(1)?.as_str())?;
    let second = parse_number(caps.get(2)?.as_str())?;
    Some((first, second))
}

/// Token symbols from groups 1 and 2 of the first match.
pub fn capture_pair(pattern: &Regex, text: &str) -> Option<(String, String)> {
    let caps = pattern.captures(text)?;
    Some((
        caps.get(1)?.as_str().to_string(),
        caps.get(2)?.as_str().to_string(),
    ))
}

/// Canonical `TOKEN0/TOKEN1` form regardless of the page's separator.
pub fn canonical_pair(token0: &str, token1: &str) -> String {
    format!("{token0}/{token1}")
}

/// Outcome of testing a price against a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeAssessment {
    pub in_range: bool,
    pub status: RangeStatus,
    pub distance_from_range: Option<String>,
}

/// Classifies `price` against `bounds` (inclusive).
///
/// Outside the range the distance is measured from the crossed boundary;
/// inside it is measured from the range midpoint.
pub fn assess_range(bounds: PriceBounds, price: Decimal) -> RangeAssessment {
    let (status, reference) = if price < bounds.lower() {
        (RangeStatus::Below, bounds.lower())
    } else if price > bounds.upper() {
        (RangeStatus::Above, bounds.upper())
    } else {
        (RangeStatus::InRange, bounds.midpoint())
    };

    RangeAssessment {
        in_range: status == RangeStatus::InRange,
        status,
        distance_from_range: Percentage::relative_change(reference, price)
            .map(|p| p.to_signed_string(2)),
    }
}

/// Status for pages that only show an active/inactive label.
pub fn status_from_flag(in_range: bool) -> RangeStatus {
    if in_range {
        RangeStatus::InRange
    } else {
        RangeStatus::OutOfRange
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_currency() {
        assert_eq!(parse_currency("$1,234.56"), Some(dec!(1234.56)));
        assert_eq!(parse_currency("~$16.02"), Some(dec!(16.02)));
        assert_eq!(parse_currency("$16K"), Some(dec!(16000)));
        assert_eq!(parse_currency("$2.5k"), Some(dec!(2500)));
        assert_eq!(parse_currency("$"), None);
        assert_eq!(parse_currency("n/a"), None);
    }

    #[test]
    fn test_parse_percent_and_number() {
        assert_eq!(parse_percent("12.5%"), Some(dec!(12.5)));
        assert_eq!(parse_percent("-33%"), Some(dec!(-33)));
        assert_eq!(parse_number("+1,000."), Some(dec!(1000)));
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_assess_range_above_below_inside() {
        let bounds = PriceBounds::ordered(dec!(10), dec!(20));

        let above = assess_range(bounds, dec!(25));
        assert_eq!(above.status, RangeStatus::Above);
        assert!(!above.in_range);
        assert_eq!(above.distance_from_range.as_deref(), Some("+25.00%"));

        let below = assess_range(bounds, dec!(8));
        assert_eq!(below.status, RangeStatus::Below);
        assert_eq!(below.distance_from_range.as_deref(), Some("-20.00%"));

        let inside = assess_range(bounds, dec!(15));
        assert_eq!(inside.status, RangeStatus::InRange);
        assert!(inside.in_range);
        assert_eq!(inside.distance_from_range.as_deref(), Some("+0.00%"));

        assert!(assess_range(bounds, dec!(20)).in_range);
    }

    #[test]
    fn test_capture_helpers() {
        let pair = Regex::new(r"([A-Z]+)\s*/\s*([A-Z]+)").unwrap();
        assert_eq!(
            capture_pair(&pair, "SOL / USDC 0.25%"),
            Some(("SOL".to_string(), "USDC".to_string()))
        );
        assert_eq!(canonical_pair("SOL", "USDC"), "SOL/USDC");

        let balance = Regex::new(r"\$([0-9,]+\.?[0-9]*)").unwrap();
        assert_eq!(capture_number(&balance, "Value $1,234.50"), Some(dec!(1234.50)));
        assert_eq!(capture_number(&balance, "no amount"), None);
    }
}

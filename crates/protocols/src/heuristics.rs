//! Named ordinal rules for pages without semantic structure.
//!
//! These replace "the n-th number on the card" guesses with explicit,
//! individually testable rules.

use crate::normalize::{capture_number, parse_number};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

static DOLLAR_AMOUNT: Lazy<Regex> = pattern!(r"\$([0-9,]+\.?[0-9]*)");
static SHORT_DOLLAR_AMOUNT: Lazy<Regex> = pattern!(r"\$([0-9]+\.?[0-9]+)");
static THOUSANDS_AMOUNT: Lazy<Regex> = pattern!(r"(?i)\$([0-9]+\.?[0-9]*)K");
static PERCENT: Lazy<Regex> = pattern!(r"([0-9]+\.?[0-9]+)%");
static PERCENT_AFTER_FEE_TIER: Lazy<Regex> =
    pattern!(r"[0-9]+\.?[0-9]+%[\s\S]*?([0-9]+\.?[0-9]+)%");
static LABELED_APR: Lazy<Regex> = pattern!(r"(?i)APR[^\d]*([0-9]+\.?[0-9]*)%");
static APR_SUFFIX: Lazy<Regex> = pattern!(r"^\s*APR");
static DAILY_RATE: Lazy<Regex> = pattern!(r"0\.0*[0-9]+%");
static MULTI_DIGIT_NUMBER: Lazy<Regex> = pattern!(r"[0-9]+\.?[0-9]+");

/// Upper bound (exclusive) for a believable position balance in USD.
pub const MAX_PLAUSIBLE_BALANCE: Decimal = dec!(1000000000);
/// Lower bound (exclusive) for a believable APY in percentage points.
pub const MIN_PLAUSIBLE_APY: Decimal = dec!(1);
/// Upper bound (exclusive) for a believable APY in percentage points.
pub const MAX_PLAUSIBLE_APY: Decimal = dec!(1000);

/// First `$` amount strictly between zero and [`MAX_PLAUSIBLE_BALANCE`].
pub fn first_plausible_balance(text: &str) -> Option<Decimal> {
    DOLLAR_AMOUNT
        .captures_iter(text)
        .filter_map(|caps| parse_number(caps.get(1)?.as_str()))
        .find(|v| *v > Decimal::ZERO && *v < MAX_PLAUSIBLE_BALANCE)
}

/// First percentage strictly between [`MIN_PLAUSIBLE_APY`] and [`MAX_PLAUSIBLE_APY`].
pub fn first_plausible_apy(text: &str) -> Option<Decimal> {
    PERCENT
        .captures_iter(text)
        .filter_map(|caps| parse_number(caps.get(1)?.as_str()))
        .find(|v| *v > MIN_PLAUSIBLE_APY && *v < MAX_PLAUSIBLE_APY)
}

/// When a card shows several `$` amounts the last one is the yield.
pub fn last_dollar_amount_as_yield(text: &str) -> Option<Decimal> {
    let amounts: Vec<Decimal> = SHORT_DOLLAR_AMOUNT
        .captures_iter(text)
        .filter_map(|caps| parse_number(caps.get(1)?.as_str()))
        .collect();
    if amounts.len() > 1 {
        amounts.last().copied()
    } else {
        None
    }
}

/// Amount written with a `K` suffix wins, otherwise the first `$` amount.
pub fn abbreviated_or_first_amount(text: &str) -> Option<Decimal> {
    match capture_number(&THOUSANDS_AMOUNT, text) {
        Some(thousands) => thousands.checked_mul(Decimal::ONE_THOUSAND),
        None => capture_number(&DOLLAR_AMOUNT, text),
    }
}

/// First percentage on a card that leads with its fee tier.
pub fn fee_tier_percent(text: &str) -> Option<Decimal> {
    capture_number(&PERCENT, text)
}

/// The percentage that follows the fee tier is the APR.
pub fn percentage_after_fee_tier(text: &str) -> Option<Decimal> {
    capture_number(&PERCENT_AFTER_FEE_TIER, text)
}

/// First percentage not immediately labelled `APR`.
pub fn fee_tier_not_followed_by_apr(text: &str) -> Option<Decimal> {
    PERCENT.captures_iter(text).find_map(|caps| {
        let whole = caps.get(0)?;
        if APR_SUFFIX.is_match(&text[whole.end()..]) {
            return None;
        }
        parse_number(caps.get(1)?.as_str())
    })
}

/// Largest positive value labelled `APR` (cards may list base and boosted).
pub fn max_labeled_apr(text: &str) -> Option<Decimal> {
    LABELED_APR
        .captures_iter(text)
        .filter_map(|caps| parse_number(caps.get(1)?.as_str()))
        .filter(|v| *v > Decimal::ZERO)
        .max()
}

/// The first `count` distinct numbers (of two or more digits), in page order.
///
/// Rows without labels list range bounds and price as min, max, current.
pub fn leading_distinct_numbers(text: &str, count: usize) -> Option<Vec<Decimal>> {
    let mut distinct: Vec<Decimal> = Vec::with_capacity(count);
    for value in MULTI_DIGIT_NUMBER
        .find_iter(text)
        .filter_map(|m| parse_number(m.as_str()))
    {
        if !distinct.contains(&value) {
            distinct.push(value);
            if distinct.len() == count {
                return Some(distinct);
            }
        }
    }
    None
}

/// Daily rate label such as `0.027%`, kept verbatim.
pub fn daily_rate_label(text: &str) -> Option<String> {
    DAILY_RATE.find(text).map(|m| m.as_str().to_string())
}

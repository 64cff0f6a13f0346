//! Hyperion (Aptos): positions list and single-position page.

use crate::draft::{DuplicatePolicy, PositionDraft, dedupe_by_pair};
use crate::error::ExtractionError;
use crate::extractor::{Extractor, PageView, ensure_content, host_matches};
use crate::heuristics::{
    abbreviated_or_first_amount, fee_tier_percent, last_dollar_amount_as_yield,
    percentage_after_fee_tier,
};
use crate::normalize::{capture_number, capture_number_pair, capture_pair};
use crate::page::{NodeKind, PageAddress, PageDocument};
use chrono::{DateTime, Utc};
use lp_watch_domain::{PortfolioSummary, Position, Protocol, Snapshot};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

static ROW_PAIR: Lazy<Regex> = pattern!(r"[A-Z]+-[A-Z]+");
static LIST_PAIR: Lazy<Regex> = pattern!(r"([A-Z][A-Za-z0-9]+)-([A-Z][A-Za-z0-9]+)");
static TEXT_PAIR: Lazy<Regex> = pattern!(r"([A-Z][A-Za-z0-9]+)\s*[-/]\s*([A-Z][A-Za-z0-9]+)");

static PRICE_RANGE: Lazy<Regex> =
    pattern!(r"(?i)Price\s+Range[:\s]+([0-9]+\.?[0-9]+)\s*~\s*([0-9]+\.?[0-9]+)");
static MIN_PRICE: Lazy<Regex> = pattern!(r"(?i)(?:Min|Low|Lower)(?:\s+Price)?[:\s]+([0-9]+\.?[0-9]+)");
static MAX_PRICE: Lazy<Regex> = pattern!(r"(?i)(?:Max|High|Upper)(?:\s+Price)?[:\s]+([0-9]+\.?[0-9]+)");
static CURRENT_PRICE: Lazy<Regex> = pattern!(r"(?i)Current\s+Price[:\s]+([0-9]+\.?[0-9]+)");
static VALUE_THOUSANDS: Lazy<Regex> = pattern!(r"(?i)Value[:\s]+\$([0-9]+\.?[0-9]*)K");
static VALUE: Lazy<Regex> =
    pattern!(r"(?i)(?:Total\s+)?(?:Balance|Value|Liquidity)[:\s]+\$([0-9,]+\.?[0-9]*)");
static POSITION_APR: Lazy<Regex> = pattern!(r"(?i)Position\s+APR[^0-9]*([0-9]+\.?[0-9]*)%");
static APR: Lazy<Regex> = pattern!(r"(?i)APR[:\s]+([0-9]+\.?[0-9]*)%");
static CLAIMABLE_REWARDS: Lazy<Regex> =
    pattern!(r"(?i)Claimable\s+Rewards[\s\S]*?≈\s*\$([0-9]+\.?[0-9]+)");
static REWARDS: Lazy<Regex> = pattern!(r"(?i)(?:Rewards?|Claimable|Pending)[:\s]+\$([0-9]+\.?[0-9]+)");

/// Row text length window (exclusive) in characters.
const MIN_ROW_LEN: usize = 20;
const MAX_ROW_LEN: usize = 500;

/// Well-known Aptos coin types.
const APTOS_TOKENS: [(&str, &str); 5] = [
    ("0x1::aptos_coin::AptosCoin", "APT"),
    (
        "0x000000000000000000000000000000000000000000000000000000000000000a",
        "APT",
    ),
    (
        "0xbae207659db88bea0cbead6da0ed00aac12edcdda169e591cd41c94180b46f3b",
        "USDC",
    ),
    (
        "0xf22bede237a07e121b56d91a491eb7bcdfd1f5907926a9e58338f964a01b17fa",
        "USDC",
    ),
    (
        "0xae478ff7d83ed072dbc5e264250e67ef58f57c99d89b447efd8a0a2e8b2be76e",
        "WBTC",
    ),
];

pub fn aptos_token_symbol(coin_type: &str) -> Option<&'static str> {
    APTOS_TOKENS
        .iter()
        .find(|(known, _)| *known == coin_type)
        .map(|(_, symbol)| *symbol)
}

pub struct HyperionExtractor;

impl Extractor for HyperionExtractor {
    fn protocol(&self) -> Protocol {
        Protocol::Hyperion
    }

    fn detect(&self, address: &PageAddress) -> bool {
        host_matches(address, &["hyperion"])
    }

    fn view(&self, address: &PageAddress) -> PageView {
        if address.path_contains("/position/") {
            PageView::Detail
        } else {
            PageView::Listing
        }
    }

    fn extract(
        &self,
        page: &PageDocument,
        captured_at: DateTime<Utc>,
    ) -> Result<Snapshot, ExtractionError> {
        ensure_content(page)?;

        let positions = match self.view(page.address()) {
            PageView::Detail => extract_detail(page, captured_at).into_iter().collect(),
            PageView::Listing => extract_listing(page, captured_at),
        };
        Ok(Snapshot::new(PortfolioSummary::default(), positions, captured_at))
    }
}

fn extract_listing(page: &PageDocument, captured_at: DateTime<Utc>) -> Vec<Position> {
    let rows = page.innermost(&[NodeKind::Block, NodeKind::Row], |e| {
        let text = e.text();
        let len = e.text_len();
        ROW_PAIR.is_match(text)
            && text.contains('%')
            && (text.contains("Add / Remove") || text.contains("Active") || text.contains("Inactive"))
            && len > MIN_ROW_LEN
            && len < MAX_ROW_LEN
    });
    debug!(rows = rows.len(), "Found Hyperion position rows");

    let positions = rows
        .iter()
        .filter_map(|row| {
            let text = row.text();
            let mut draft = PositionDraft::new();
            draft
                .tokens(capture_pair(&LIST_PAIR, text))
                .fee_tier(fee_tier_percent(text))
                .balance(abbreviated_or_first_amount(text))
                .apy(percentage_after_fee_tier(text))
                .pending_yield(last_dollar_amount_as_yield(text))
                .in_range_label(Some(text.contains("Active")));
            draft.finish(captured_at)
        })
        .collect();
    dedupe_by_pair(positions, DuplicatePolicy::KeepLargest)
}

/// Tokens named by the `currencyA`/`currencyB` query parameters.
fn tokens_from_address(address: &PageAddress) -> Option<(String, String)> {
    let currency_a = address.query_param("currencyA")?;
    let currency_b = address.query_param("currencyB")?;
    Some((
        aptos_token_symbol(&currency_a).unwrap_or("Token0").to_string(),
        aptos_token_symbol(&currency_b).unwrap_or("Token1").to_string(),
    ))
}

fn extract_detail(page: &PageDocument, captured_at: DateTime<Utc>) -> Option<Position> {
    let mut draft = PositionDraft::new();
    draft
        .tokens(tokens_from_address(page.address()))
        .tokens(capture_pair(&TEXT_PAIR, page.body_text()));

    let kinds = [
        NodeKind::Block,
        NodeKind::Inline,
        NodeKind::Paragraph,
        NodeKind::Cell,
    ];
    for element in page.elements_of(&kinds) {
        let text = element.text();
        let thousands = capture_number(&VALUE_THOUSANDS, text)
            .and_then(|v| v.checked_mul(Decimal::ONE_THOUSAND));
        draft
            .range(capture_number_pair(&PRICE_RANGE, text))
            .range_min(capture_number(&MIN_PRICE, text))
            .range_max(capture_number(&MAX_PRICE, text))
            .current_price(capture_number(&CURRENT_PRICE, text))
            .balance(thousands.or_else(|| capture_number(&VALUE, text)))
            .apy(capture_number(&POSITION_APR, text).or_else(|| capture_number(&APR, text)))
            .pending_yield(
                capture_number(&CLAIMABLE_REWARDS, text).or_else(|| capture_number(&REWARDS, text)),
            );
    }

    let position = draft.finish(captured_at);
    if position.is_none() {
        debug!(url = %page.address(), "Hyperion detail page lacks pair or value");
    }
    position
}

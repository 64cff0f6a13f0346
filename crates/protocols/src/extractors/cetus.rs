//! Cetus (Sui) liquidity cards.

use crate::draft::{DuplicatePolicy, PositionDraft, dedupe_by_pair};
use crate::error::ExtractionError;
use crate::extractor::{Extractor, ensure_content, host_matches};
use crate::heuristics::fee_tier_not_followed_by_apr;
use crate::normalize::{capture_number, capture_number_pair, capture_pair};
use crate::page::{NodeKind, PageAddress, PageDocument};
use chrono::{DateTime, Utc};
use lp_watch_domain::{PortfolioSummary, Position, Protocol, Snapshot};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static CARD_PAIR: Lazy<Regex> = pattern!(r"[A-Z]+\s*-\s*[A-Z]+");
static PAIR: Lazy<Regex> = pattern!(r"([A-Z][A-Za-z0-9]+)\s*-\s*([A-Z][A-Za-z0-9]+)");
static LIQUIDITY: Lazy<Regex> = pattern!(r"(?i)Liquidity[\s\S]*?\$([0-9,]+\.?[0-9]*)");
static APR: Lazy<Regex> = pattern!(r"(?i)APR[\s\S]*?([0-9]+\.?[0-9]*)%");
static CLAIMABLE_YIELD: Lazy<Regex> = pattern!(r"(?i)Claimable Yield[\s\S]*?\$([0-9,]+\.?[0-9]*)");
static PRICE_RANGE: Lazy<Regex> =
    pattern!(r"(?i)Price Range[\s\S]*?([0-9]+\.?[0-9]+)\s*-\s*([0-9]+\.?[0-9]+)");
static CURRENT_PRICE: Lazy<Regex> = pattern!(r"(?i)Current Price[\s\S]*?([0-9]+\.?[0-9]+)");

/// Card text length window (exclusive) in characters.
const MIN_CARD_LEN: usize = 50;
const MAX_CARD_LEN: usize = 2000;

pub struct CetusExtractor;

impl Extractor for CetusExtractor {
    fn protocol(&self) -> Protocol {
        Protocol::Cetus
    }

    fn detect(&self, address: &PageAddress) -> bool {
        host_matches(address, &["cetus.zone"])
    }

    fn extract(
        &self,
        page: &PageDocument,
        captured_at: DateTime<Utc>,
    ) -> Result<Snapshot, ExtractionError> {
        ensure_content(page)?;

        let cards = page.innermost(&[NodeKind::Block], |e| {
            let text = e.text();
            let len = e.text_len();
            CARD_PAIR.is_match(text)
                && text.contains("APR")
                && text.contains("Liquidity")
                && len > MIN_CARD_LEN
                && len < MAX_CARD_LEN
        });
        debug!(cards = cards.len(), "Found Cetus position cards");

        let positions: Vec<_> = cards
            .iter()
            .filter_map(|card| parse_card(card.text(), captured_at))
            .collect();
        let positions = dedupe_by_pair(positions, DuplicatePolicy::KeepSmallest);

        Ok(Snapshot::new(PortfolioSummary::default(), positions, captured_at))
    }
}

fn parse_card(text: &str, captured_at: DateTime<Utc>) -> Option<Position> {
    let mut draft = PositionDraft::new();
    draft
        .tokens(capture_pair(&PAIR, text))
        .fee_tier(fee_tier_not_followed_by_apr(text))
        .balance(capture_number(&LIQUIDITY, text))
        .apy(capture_number(&APR, text))
        .pending_yield(capture_number(&CLAIMABLE_YIELD, text))
        .range(capture_number_pair(&PRICE_RANGE, text))
        .current_price(capture_number(&CURRENT_PRICE, text))
        .in_range_label(Some(text.contains("Active")));
    draft.finish(captured_at)
}

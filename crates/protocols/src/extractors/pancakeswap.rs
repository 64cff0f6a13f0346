//! PancakeSwap v3: positions table and single-position page.

use crate::draft::{DuplicatePolicy, PositionDraft, dedupe_by_pair};
use crate::error::ExtractionError;
use crate::extractor::{Extractor, PageView, ensure_content, host_matches};
use crate::heuristics::leading_distinct_numbers;
use crate::normalize::{capture_number, capture_pair};
use crate::page::{Element, NodeKind, PageAddress, PageDocument};
use chrono::{DateTime, Utc};
use lp_watch_domain::{PortfolioSummary, Position, Protocol, Snapshot};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static ROW_PAIR: Lazy<Regex> = pattern!(r"([A-Za-z0-9]+)[\s\-/]+([A-Za-z0-9]+)");
static ROW_BALANCE: Lazy<Regex> = pattern!(r"\$([0-9,]+\.?[0-9]*)");
static ROW_APR: Lazy<Regex> = pattern!(r"([0-9]+\.?[0-9]*)%");
static ROW_PENDING: Lazy<Regex> = pattern!(r"(?i)(?:Pending|Unclaimed|Rewards?)[^\$]*\$([0-9,]+\.?[0-9]*)");

static DETAIL_PAIR: Lazy<Regex> = pattern!(r"^([A-Z][A-Za-z0-9]+)[-/]([A-Z][A-Za-z0-9]+)$");
static DETAIL_BALANCE: Lazy<Regex> =
    pattern!(r"(?i)(?:Liquidity|Value|Position Value)[:\s]+\$([0-9,]+\.?[0-9]*)");
static DETAIL_APR: Lazy<Regex> = pattern!(r"(?i)APR[^0-9]*([0-9]+\.?[0-9]*)%");
static UNCLAIMED_FEES: Lazy<Regex> = pattern!(r"(?i)Unclaimed\s+Fees[:\s]+\$([0-9,]+\.?[0-9]+)");
static MIN_PRICE: Lazy<Regex> = pattern!(r"(?i)Min\s+Price[:\s]+([0-9,]+\.?[0-9]+)");
static MAX_PRICE: Lazy<Regex> = pattern!(r"(?i)Max\s+Price[:\s]+([0-9,]+\.?[0-9]+)");
static CURRENT_PRICE: Lazy<Regex> = pattern!(r"(?i)Current\s+Price[:\s]+([0-9,]+\.?[0-9]+)");

const MIN_CELLS: usize = 3;
/// A standalone pair heading is short.
const MAX_PAIR_LABEL_LEN: usize = 30;

pub struct PancakeSwapExtractor;

impl Extractor for PancakeSwapExtractor {
    fn protocol(&self) -> Protocol {
        Protocol::PancakeSwap
    }

    fn detect(&self, address: &PageAddress) -> bool {
        host_matches(address, &["pancakeswap.finance"])
    }

    fn view(&self, address: &PageAddress) -> PageView {
        if address.path_contains("/liquidity/") {
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
            PageView::Listing => {
                let rows: Vec<_> = page
                    .elements_of(&[NodeKind::Row])
                    .filter_map(|row| parse_row(row, captured_at))
                    .collect();
                dedupe_by_pair(rows, DuplicatePolicy::KeepLargest)
            }
        };
        debug!(positions = positions.len(), "Extracted PancakeSwap positions");
        Ok(Snapshot::new(PortfolioSummary::default(), positions, captured_at))
    }
}

fn parse_row(row: Element<'_>, captured_at: DateTime<Utc>) -> Option<Position> {
    if row.find_all(&[NodeKind::Cell]).len() < MIN_CELLS {
        return None;
    }
    let text = row.text();

    let mut draft = PositionDraft::new();
    draft
        .tokens(capture_pair(&ROW_PAIR, text))
        .balance(capture_number(&ROW_BALANCE, text))
        .apy(capture_number(&ROW_APR, text))
        .pending_yield(capture_number(&ROW_PENDING, text));
    if let Some([min, max, current]) = leading_distinct_numbers(text, 3).as_deref() {
        draft
            .range(Some((*min, *max)))
            .current_price(Some(*current));
    }
    draft.finish(captured_at)
}

fn extract_detail(page: &PageDocument, captured_at: DateTime<Utc>) -> Option<Position> {
    let kinds = [
        NodeKind::Block,
        NodeKind::Inline,
        NodeKind::Paragraph,
        NodeKind::Heading,
    ];

    let mut draft = PositionDraft::new();
    for element in page.elements_of(&kinds) {
        let text = element.text();
        let label = text.trim();
        if label.chars().count() < MAX_PAIR_LABEL_LEN {
            draft.tokens(capture_pair(&DETAIL_PAIR, label));
        }
        draft
            .balance(capture_number(&DETAIL_BALANCE, text))
            .apy(capture_number(&DETAIL_APR, text))
            .pending_yield(capture_number(&UNCLAIMED_FEES, text))
            .range_min(capture_number(&MIN_PRICE, text))
            .range_max(capture_number(&MAX_PRICE, text))
            .current_price(capture_number(&CURRENT_PRICE, text));
    }
    draft.finish(captured_at)
}

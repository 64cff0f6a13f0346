//! Orca Whirlpools portfolio table.

use crate::draft::{DuplicatePolicy, PositionDraft, dedupe_by_pair};
use crate::error::ExtractionError;
use crate::extractor::{Extractor, ensure_content, host_matches};
use crate::normalize::{capture_number, capture_pair, parse_number};
use crate::page::{Element, NodeKind, PageAddress, PageDocument};
use chrono::{DateTime, Utc};
use lp_watch_domain::{PortfolioSummary, Position, Protocol, Snapshot};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

static POOL_PAIR: Lazy<Regex> = pattern!(r"([A-Za-z0-9]+)\s*/\s*([A-Za-z0-9]+)");
static FEE_TIER: Lazy<Regex> = pattern!(r"([0-9.]+)%");
static CENTS_AMOUNT: Lazy<Regex> = pattern!(r"\$([0-9,]+\.[0-9]{2})");
static PERCENT_WITH_DECIMALS: Lazy<Regex> = pattern!(r"([0-9]+\.[0-9]+)%");
static SIGNED_PERCENT: Lazy<Regex> = pattern!(r"[+-]?[0-9.]+%");
static RANGE_NUMBER: Lazy<Regex> = pattern!(r"[0-9]+\.?[0-9]+");
static PRICE: Lazy<Regex> = pattern!(r"([0-9]+(?:\.[0-9]+)?)");

/// Cells in a position row: pool, balance, pending yield, APY, range, price.
const MIN_CELLS: usize = 6;

const SUMMARY_KINDS: [NodeKind; 7] = [
    NodeKind::Body,
    NodeKind::Block,
    NodeKind::Inline,
    NodeKind::Paragraph,
    NodeKind::Heading,
    NodeKind::Table,
    NodeKind::Cell,
];

pub struct OrcaExtractor;

impl Extractor for OrcaExtractor {
    fn protocol(&self) -> Protocol {
        Protocol::Orca
    }

    fn detect(&self, address: &PageAddress) -> bool {
        host_matches(address, &["orca.so"])
    }

    fn extract(
        &self,
        page: &PageDocument,
        captured_at: DateTime<Utc>,
    ) -> Result<Snapshot, ExtractionError> {
        ensure_content(page)?;

        let summary = extract_summary(page);
        let positions: Vec<_> = page
            .elements_of(&[NodeKind::Row])
            .filter_map(|row| extract_row(row, captured_at))
            .collect();
        let positions = dedupe_by_pair(positions, DuplicatePolicy::KeepLargest);

        debug!(positions = positions.len(), "Extracted Orca positions");
        Ok(Snapshot::new(summary, positions, captured_at))
    }
}

/// Text of the smallest region carrying every marker.
fn labelled_region<'a>(page: &'a PageDocument, label: &str, marker: char) -> Option<&'a str> {
    page.innermost(&SUMMARY_KINDS, |e| {
        e.text().contains(label) && e.text().contains(marker)
    })
    .first()
    .map(|e| e.text())
}

fn extract_summary(page: &PageDocument) -> PortfolioSummary {
    let mut summary = PortfolioSummary::default();
    if let Some(text) = labelled_region(page, "Total Value", '$') {
        summary.total_value = capture_number(&CENTS_AMOUNT, text);
    }
    if let Some(text) = labelled_region(page, "Estimated Yield", '%') {
        summary.estimated_yield_amount = capture_number(&CENTS_AMOUNT, text);
        summary.estimated_yield_percent = capture_number(&PERCENT_WITH_DECIMALS, text);
    }
    if let Some(text) = labelled_region(page, "Pending Yield", '$') {
        summary.pending_yield = capture_number(&CENTS_AMOUNT, text);
    }
    summary
}

fn extract_row(row: Element<'_>, captured_at: DateTime<Utc>) -> Option<Position> {
    let cells = row.find_all(&[NodeKind::Cell]);
    if cells.len() < MIN_CELLS {
        return None;
    }

    let mut draft = PositionDraft::new();
    let pool = cells[0].text();
    if pool.contains('/') {
        draft
            .tokens(capture_pair(&POOL_PAIR, pool))
            .fee_tier(capture_number(&FEE_TIER, pool));
    }
    draft
        .balance(capture_number(&CENTS_AMOUNT, cells[1].text()))
        .pending_yield(capture_number(&CENTS_AMOUNT, cells[2].text()))
        .apy(capture_number(&FEE_TIER, cells[3].text()));

    let (numbers, percents) = split_range_cell(cells[4].text());
    if let [lower, upper, ..] = numbers[..] {
        draft.range(Some((lower, upper)));
    }
    if let [lower, upper, ..] = &percents[..] {
        draft.range_percents(Some(lower.clone()), Some(upper.clone()));
    }
    draft.current_price(capture_number(&PRICE, cells[5].text()));

    draft.finish(captured_at)
}

/// Splits the range cell into distinct bound values and percent labels.
///
/// Lines holding a `%` are labels; every other line contributes numbers.
fn split_range_cell(text: &str) -> (Vec<Decimal>, Vec<String>) {
    let mut numbers: Vec<Decimal> = Vec::new();
    let mut percents = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.contains('%') {
            percents.extend(
                SIGNED_PERCENT
                    .find_iter(line)
                    .map(|m| m.as_str())
                    .filter(|p| p.trim_start_matches(['+', '-']).starts_with(|c: char| c.is_ascii_digit()))
                    .map(str::to_string),
            );
        } else {
            for value in RANGE_NUMBER.find_iter(line).filter_map(|m| parse_number(m.as_str())) {
                if !numbers.contains(&value) {
                    numbers.push(value);
                }
            }
        }
    }
    (numbers, percents)
}

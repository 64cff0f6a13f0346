//! Raydium CLMM position cards.

use crate::draft::{DuplicatePolicy, PositionDraft, dedupe_by_pair};
use crate::error::ExtractionError;
use crate::extractor::{Extractor, ensure_content, host_matches};
use crate::normalize::{capture_number, capture_number_pair, capture_pair};
use crate::page::{NodeKind, PageAddress, PageDocument};
use chrono::{DateTime, Utc};
use lp_watch_domain::{PortfolioSummary, Position, Protocol, Snapshot};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static PAIR: Lazy<Regex> = pattern!(r"([A-Z][A-Za-z0-9]+)\s*/\s*([A-Z][A-Za-z0-9]+)");
static BALANCE: Lazy<Regex> = pattern!(r"Position\s*\$([0-9,]+\.?[0-9]*)");
static APR: Lazy<Regex> = pattern!(r"APR\s*([0-9]+\.?[0-9]*)%");
static CURRENT_PRICE: Lazy<Regex> = pattern!(r"Current Price:\s*([0-9]+\.?[0-9]*)");
static RANGE: Lazy<Regex> = pattern!(r"([0-9]+\.?[0-9]+)\s*-\s*([0-9]+\.?[0-9]+)");
static PENDING_YIELD: Lazy<Regex> = pattern!(r"Pending Yield[^\$]*\$([0-9,]+\.?[0-9]*)");
static PENDING_YIELD_BARE: Lazy<Regex> = pattern!(r"Pending Yield[^\d]*([0-9,]+\.?[0-9]+)");
static HEADER_PENDING_YIELD: Lazy<Regex> = pattern!(r"Pending Yield[^\d]*([0-9,]+\.?[0-9]*)");
static FIRST_AMOUNT: Lazy<Regex> = pattern!(r"\$([0-9,]+\.?[0-9]*)");

/// Markers that identify a liquidity section.
const SECTION_MARKERS: [&str; 4] = ["My Position", "Pending Yield", "CLMM", "Current Price"];

const CONTAINER_KINDS: [NodeKind; 2] = [NodeKind::Block, NodeKind::Body];

pub struct RaydiumExtractor;

impl Extractor for RaydiumExtractor {
    fn protocol(&self) -> Protocol {
        Protocol::Raydium
    }

    fn detect(&self, address: &PageAddress) -> bool {
        host_matches(address, &["raydium.io"])
    }

    fn extract(
        &self,
        page: &PageDocument,
        captured_at: DateTime<Utc>,
    ) -> Result<Snapshot, ExtractionError> {
        ensure_content(page)?;

        let sections = page.innermost(&CONTAINER_KINDS, |e| {
            SECTION_MARKERS.iter().all(|m| e.text().contains(m))
        });
        if sections.is_empty() {
            debug!("No Raydium liquidity section found");
        }

        let mut summary = PortfolioSummary::default();
        if let Some(section) = sections.first() {
            summary.pending_yield = capture_number(&HEADER_PENDING_YIELD, section.text());
        }
        if let Some(overview) = page
            .innermost(&CONTAINER_KINDS, |e| {
                e.text().contains("Wallet Overview") && e.text().contains('$')
            })
            .first()
        {
            summary.total_value = capture_number(&FIRST_AMOUNT, overview.text());
        }

        let positions: Vec<_> = sections
            .iter()
            .filter_map(|section| parse_section(section.text(), captured_at))
            .collect();
        let positions = dedupe_by_pair(positions, DuplicatePolicy::KeepLargest);

        Ok(Snapshot::new(summary, positions, captured_at))
    }
}

fn parse_section(text: &str, captured_at: DateTime<Utc>) -> Option<Position> {
    let mut draft = PositionDraft::new();
    draft
        .tokens(capture_pair(&PAIR, text))
        .balance(capture_number(&BALANCE, text))
        .apy(capture_number(&APR, text))
        .current_price(capture_number(&CURRENT_PRICE, text))
        .range(capture_number_pair(&RANGE, text))
        .pending_yield(capture_number(&PENDING_YIELD, text))
        .pending_yield(capture_number(&PENDING_YIELD_BARE, text));
    draft.finish(captured_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::ElementSpec;
    use lp_watch_domain::RangeStatus;
    use rust_decimal_macros::dec;

    fn lines(tag: &str, lines: &[&str]) -> ElementSpec {
        ElementSpec::new(tag).children(lines.iter().map(|l| ElementSpec::with_text("div", *l)))
    }

    fn page(root: ElementSpec) -> PageDocument {
        let address = PageAddress::parse("https://raydium.io/portfolio/").unwrap();
        PageDocument::new(address, "Raydium", &root)
    }

    #[test]
    fn test_extracts_liquidity_section() {
        let root = ElementSpec::new("body")
            .child(lines("div", &["Wallet Overview", "$2,500.00"]))
            .child(lines(
                "div",
                &[
                    "My Position",
                    "Pending Yield",
                    "$3.21",
                    "RAY/USDC CLMM",
                    "Position",
                    "$1,000.50",
                    "APR 35.4%",
                    "Current Price: 2.45",
                    "2.00 - 3.00",
                ],
            ));
        let snapshot = RaydiumExtractor.extract(&page(root), Utc::now()).unwrap();

        assert_eq!(snapshot.summary.total_value, Some(dec!(2500.00)));
        assert_eq!(snapshot.summary.pending_yield, Some(dec!(3.21)));
        let position = &snapshot.positions[0];
        assert_eq!(position.pair.as_deref(), Some("RAY/USDC"));
        assert_eq!(position.balance, Some(dec!(1000.50)));
        assert_eq!(position.pending_yield, Some(dec!(3.21)));
        assert_eq!(position.apy, Some(dec!(35.4)));
        assert_eq!(position.current_price, Some(dec!(2.45)));
        assert_eq!(position.range_min, Some(dec!(2.00)));
        assert_eq!(position.range_max, Some(dec!(3.00)));
        assert_eq!(position.range_status, Some(RangeStatus::InRange));
    }

    #[test]
    fn test_missing_section_yields_no_positions() {
        let root = lines("body", &["Connect wallet to view positions"]);
        let snapshot = RaydiumExtractor.extract(&page(root), Utc::now()).unwrap();
        assert!(snapshot.positions.is_empty());
        assert!(snapshot.summary.is_empty());
    }
}

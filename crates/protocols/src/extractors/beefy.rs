//! Beefy concentrated liquidity manager (CLM) vaults: dashboard and vault page.

use crate::draft::{DuplicatePolicy, PositionDraft, dedupe_by_pair};
use crate::error::ExtractionError;
use crate::extractor::{Extractor, PageView, ensure_content, host_matches};
use crate::heuristics::{daily_rate_label, first_plausible_apy, first_plausible_balance};
use crate::normalize::{capture_number, capture_pair, capture_text};
use crate::page::{Element, NodeKind, PageAddress, PageDocument};
use chrono::{DateTime, Utc};
use lp_watch_domain::{PortfolioSummary, Position, Protocol, Snapshot};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

// Vault names join tokens with a hyphen, en/em dash or a zero-width space.
static CARD_PAIR: Lazy<Regex> = pattern!(
    r"([a-z]*[A-Z][A-Za-z0-9]+)[\x{2D}\x{2013}\x{2014}\x{200B}]+([a-z]*[A-Z][A-Za-z0-9]+)"
);
static TITLE_PAIR: Lazy<Regex> =
    pattern!(r"^([A-Z][A-Za-z0-9]+)[\x{2D}\x{2013}\x{2014}\x{200B}]+([A-Z][A-Za-z0-9]+)$");
static CLM: Lazy<Regex> = pattern!(r"(?i)CLM");
static ANY_AMOUNT: Lazy<Regex> = pattern!(r"\$[0-9,]+");
static NETWORK: Lazy<Regex> =
    pattern!(r"(?i)(Arbitrum|Base|Optimism|Polygon|Ethereum|BSC|Avalanche|Fantom)");
static PLATFORM: Lazy<Regex> = pattern!(r"(?i)(Uniswap|PancakeSwap|SushiSwap|Balancer|Curve)");

static DEPOSITED: Lazy<Regex> = pattern!(r"(?i)Deposited[:\s]+\$([0-9,]+)");
static AVG_APY: Lazy<Regex> = pattern!(r"(?i)Avg\.?\s+APY[:\s]+([0-9]+\.?[0-9]*)%");
static DAILY_YIELD: Lazy<Regex> = pattern!(r"(?i)Daily\s+yield[:\s]+\$([0-9.]+)");

static CHAIN: Lazy<Regex> = pattern!(r"(?i)CHAIN:\s*(Arbitrum|Base|Optimism|Polygon|Ethereum|BSC)");
static VAULT_PLATFORM: Lazy<Regex> =
    pattern!(r"(?i)PLATFORM:\s*(Uniswap|PancakeSwap|SushiSwap|Balancer|Curve)");
static VAULT_APY: Lazy<Regex> = pattern!(r"(?i)^APY\s+([0-9]+\.?[0-9]*)%$");
static YOUR_DEPOSIT: Lazy<Regex> = pattern!(r"(?i)Your Deposit[\s\S]*?\$([0-9,]+\.?[0-9]*)");
static MIN_PRICE: Lazy<Regex> = pattern!(r"(?i)Min Price\s+([0-9]+\.?[0-9]+)");
static MAX_PRICE: Lazy<Regex> = pattern!(r"(?i)Max Price\s+([0-9]+\.?[0-9]+)");
static PRICE_IN_RANGE: Lazy<Regex> =
    pattern!(r"(?i)Current Price\s*\(In Range\)\s+([0-9]+\.?[0-9]+)");
static PRICE_OUT_OF_RANGE: Lazy<Regex> =
    pattern!(r"(?i)Current Price\s*\(Out of Range\)\s+([0-9]+\.?[0-9]+)");
static PRICE: Lazy<Regex> = pattern!(r"(?i)Current Price\s+([0-9]+\.?[0-9]+)");

/// Link text length window (exclusive) for a vault card.
const MIN_CARD_LEN: usize = 30;
const MAX_CARD_LEN: usize = 1000;
/// Ancestors searched for the network label, and their size cap.
const MAX_NETWORK_DEPTH: usize = 10;
const MAX_NETWORK_REGION_LEN: usize = 2000;
const MAX_PAIR_LABEL_LEN: usize = 30;

const TEXT_KINDS: [NodeKind; 3] = [NodeKind::Block, NodeKind::Inline, NodeKind::Paragraph];

pub struct BeefyExtractor;

impl Extractor for BeefyExtractor {
    fn protocol(&self) -> Protocol {
        Protocol::Beefy
    }

    fn detect(&self, address: &PageAddress) -> bool {
        host_matches(address, &["beefy"])
    }

    fn view(&self, address: &PageAddress) -> PageView {
        if address.path_contains("/vault/") {
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

        match self.view(page.address()) {
            PageView::Detail => {
                let positions: Vec<_> = extract_vault(page, captured_at).into_iter().collect();
                Ok(Snapshot::new(PortfolioSummary::default(), positions, captured_at))
            }
            PageView::Listing => {
                let summary = extract_summary(page);
                let cards: Vec<_> = page
                    .links_with_href("vault")
                    .into_iter()
                    .filter(is_vault_card)
                    .collect();
                debug!(cards = cards.len(), "Found Beefy vault cards");

                let positions: Vec<_> = cards
                    .into_iter()
                    .filter_map(|card| parse_card(card, captured_at))
                    .collect();
                let positions = dedupe_by_pair(positions, DuplicatePolicy::KeepLargest);
                Ok(Snapshot::new(summary, positions, captured_at))
            }
        }
    }
}

fn extract_summary(page: &PageDocument) -> PortfolioSummary {
    let mut summary = PortfolioSummary::default();
    for element in page.elements_of(&TEXT_KINDS) {
        let text = element.text();
        if summary.total_value.is_none() {
            summary.total_value = capture_number(&DEPOSITED, text);
        }
        if summary.avg_apy.is_none() {
            summary.avg_apy = capture_number(&AVG_APY, text);
        }
        if summary.daily_yield.is_none() {
            summary.daily_yield = capture_number(&DAILY_YIELD, text);
        }
    }
    summary
}

fn is_vault_card(link: &Element<'_>) -> bool {
    let text = link.text();
    let len = link.text_len();
    CLM.is_match(text) && ANY_AMOUNT.is_match(text) && len > MIN_CARD_LEN && len < MAX_CARD_LEN
}

/// Network named on the card, or on the nearest enclosing region showing both tokens.
fn card_network(card: &Element<'_>, tokens: Option<&(String, String)>) -> Option<String> {
    if let Some(network) = capture_text(&NETWORK, card.text()) {
        return Some(network.to_string());
    }
    let (token0, token1) = tokens?;
    card.ancestors()
        .take(MAX_NETWORK_DEPTH)
        .filter(|e| e.text_len() < MAX_NETWORK_REGION_LEN)
        .filter(|e| e.text().contains(token0.as_str()) && e.text().contains(token1.as_str()))
        .find_map(|e| capture_text(&NETWORK, e.text()))
        .map(str::to_string)
}

fn parse_card(card: Element<'_>, captured_at: DateTime<Utc>) -> Option<Position> {
    let text = card.text();
    let tokens = capture_pair(&CARD_PAIR, text);
    let network = card_network(&card, tokens.as_ref());

    let mut draft = PositionDraft::new();
    draft
        .tokens(tokens)
        .network(network)
        .protocol(capture_text(&PLATFORM, text).map(str::to_string))
        .balance(first_plausible_balance(text))
        .apy(first_plausible_apy(text))
        .daily_yield(daily_rate_label(text));
    draft.finish(captured_at)
}

fn extract_vault(page: &PageDocument, captured_at: DateTime<Utc>) -> Option<Position> {
    let kinds = [
        NodeKind::Block,
        NodeKind::Inline,
        NodeKind::Paragraph,
        NodeKind::Heading,
    ];

    let mut draft = PositionDraft::new();
    for element in page.elements_of(&kinds) {
        let text = element.text();
        if element.text_len() < MAX_PAIR_LABEL_LEN {
            draft.tokens(capture_pair(&TITLE_PAIR, text));
        }
        draft
            .network(capture_text(&CHAIN, text).map(str::to_string))
            .protocol(capture_text(&VAULT_PLATFORM, text).map(str::to_string))
            .apy(capture_number(&VAULT_APY, text))
            .balance(capture_number(&YOUR_DEPOSIT, text))
            .range_min(capture_number(&MIN_PRICE, text))
            .range_max(capture_number(&MAX_PRICE, text));

        if let Some(price) = capture_number(&PRICE_IN_RANGE, text) {
            draft.current_price(Some(price)).in_range_label(Some(true));
        } else if let Some(price) = capture_number(&PRICE_OUT_OF_RANGE, text) {
            draft.current_price(Some(price)).in_range_label(Some(false));
        } else {
            draft.current_price(capture_number(&PRICE, text));
        }
    }
    draft.finish(captured_at)
}

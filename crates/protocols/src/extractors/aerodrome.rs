//! Aerodrome (Base) concentrated liquidity deposits.

use crate::draft::{DuplicatePolicy, PositionDraft, dedupe_by_pair};
use crate::error::ExtractionError;
use crate::extractor::{Extractor, ensure_content, host_matches};
use crate::heuristics::max_labeled_apr;
use crate::normalize::{capture_number, capture_number_pair, capture_text, parse_number};
use crate::page::{Element, NodeKind, PageAddress, PageDocument};
use chrono::{DateTime, Utc};
use lp_watch_domain::{PortfolioSummary, Position, Protocol, Snapshot};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

static TOKEN0: Lazy<Regex> = pattern!(r"token0=(0x[a-fA-F0-9]+)");
static TOKEN1: Lazy<Regex> = pattern!(r"token1=(0x[a-fA-F0-9]+)");
static DEPOSITED: Lazy<Regex> = pattern!(r"(?i)Deposited[\s\S]*?~\$([0-9,]+\.?[0-9]*)");
static RANGE: Lazy<Regex> = pattern!(r"(?i)Range[^\d]*([0-9]+\.?[0-9]+)[^\d]+([0-9]+\.?[0-9]+)");
static CURRENT: Lazy<Regex> = pattern!(r"(?i)Current[^\d]*([0-9]+\.?[0-9]+)");
static TRADING_FEES: Lazy<Regex> = pattern!(r"(?i)Trading Fees[\s\S]*?([0-9]+\.?[0-9]*)\s+USDC");
static EMISSIONS: Lazy<Regex> = pattern!(r"(?i)Emissions[\s\S]*?([0-9]+\.?[0-9]*)\s+AERO");

/// Ancestors inspected, starting at the link's enclosing block.
const MAX_CONTAINER_DEPTH: usize = 10;

/// Well-known Base token addresses (lowercase).
const BASE_TOKENS: [(&str, &str); 10] = [
    ("0x833589fcd6edb6e08f4c7c32d4f71b54bda02913", "USDC"),
    ("0xcbb7c0000ab88b473b1f5afd9ef808440eed33bf", "cbBTC"),
    ("0x4200000000000000000000000000000000000006", "WETH"),
    ("0x940181a94a35a4569e4529a3cdfb74e38fd98631", "AERO"),
    ("0x50c5725949a6f0c72e6c4a641f24049a917db0cb", "DAI"),
    ("0x2ae3f1ec7f1f5012cfeab0185bfc7aa3cf0dec22", "cbETH"),
    ("0x60a3e35cc302bfa44cb288bc5a4f316fdb1adb42", "EURC"),
    ("0x04d5ddf5f3a8939889f11e97f8c4bb48317f1938", "USDz"),
    ("0x236aa50979d5f3de3bd1eeb40e81137f22ab794b", "tBTC"),
    ("0xd9aaec86b65d86f6a7b5b1b0c42ffa531710b6ca", "USDbC"),
];

/// Symbol for a Base token address, or `Token0x1234` for unknown ones.
pub fn base_token_symbol(address: &str) -> String {
    let address = address.to_ascii_lowercase();
    BASE_TOKENS
        .iter()
        .find(|(known, _)| *known == address)
        .map(|(_, symbol)| symbol.to_string())
        .unwrap_or_else(|| format!("Token{}", &address[..address.len().min(6)]))
}

pub struct AerodromeExtractor;

impl Extractor for AerodromeExtractor {
    fn protocol(&self) -> Protocol {
        Protocol::Aerodrome
    }

    fn detect(&self, address: &PageAddress) -> bool {
        host_matches(address, &["aerodrome.finance"])
    }

    fn extract(
        &self,
        page: &PageDocument,
        captured_at: DateTime<Utc>,
    ) -> Result<Snapshot, ExtractionError> {
        ensure_content(page)?;

        let links = page.links_with_href("/deposit?token0=");
        debug!(links = links.len(), "Found Aerodrome deposit links");

        let positions: Vec<_> = links
            .into_iter()
            .filter_map(|link| parse_deposit(link, captured_at))
            .collect();
        let positions = dedupe_by_pair(positions, DuplicatePolicy::KeepLargest);

        Ok(Snapshot::new(PortfolioSummary::default(), positions, captured_at))
    }
}

/// Nearest enclosing region that shows the deposited amount.
fn deposit_container<'a>(link: &Element<'a>) -> Option<Element<'a>> {
    link.ancestors()
        .skip_while(|e| e.kind() != NodeKind::Block)
        .take(MAX_CONTAINER_DEPTH)
        .find(|e| e.text().contains("Deposited") && e.text().contains("~$"))
}

fn parse_deposit(link: Element<'_>, captured_at: DateTime<Utc>) -> Option<Position> {
    let href = link.attr("href")?;
    let token0 = base_token_symbol(capture_text(&TOKEN0, href)?);
    let token1 = base_token_symbol(capture_text(&TOKEN1, href)?);

    let Some(container) = deposit_container(&link) else {
        debug!(pair = %format!("{token0}/{token1}"), "No deposit container found");
        return None;
    };
    let text = container.text();

    let mut draft = PositionDraft::new();
    draft
        .tokens(Some((token0, token1)))
        .balance(capture_number(&DEPOSITED, text))
        .apy(max_labeled_apr(text))
        .pending_yield(pending_rewards(text));

    let automated = text.contains("ALM")
        || text.contains("Automated")
        || !container.links_with_href("&alm=").is_empty();
    if automated {
        draft.automated();
    } else {
        draft
            .range(capture_number_pair(&RANGE, text))
            .current_price(capture_number(&CURRENT, text));
    }
    draft.finish(captured_at)
}

/// Trading fees in USDC plus emissions in AERO, valued at one dollar each.
fn pending_rewards(text: &str) -> Option<Decimal> {
    let total = TRADING_FEES
        .captures_iter(text)
        .chain(EMISSIONS.captures_iter(text))
        .filter_map(|caps| parse_number(caps.get(1)?.as_str()))
        .filter(|amount| *amount > Decimal::ZERO)
        .fold(Decimal::ZERO, Decimal::saturating_add);
    (total > Decimal::ZERO).then_some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::ElementSpec;
    use lp_watch_domain::RangeStatus;
    use rust_decimal_macros::dec;

    const WETH_USDC: &str = "/deposit?token0=0x4200000000000000000000000000000000000006&token1=0x833589fcd6edb6e08f4c7c32d4f71b54bda02913";

    fn card(href: &str, lines: &[&str]) -> ElementSpec {
        ElementSpec::new("div")
            .children(lines.iter().map(|l| ElementSpec::with_text("div", *l)))
            .child(
                ElementSpec::new("div")
                    .child(ElementSpec::new("a").attr("href", href).text("Deposit")),
            )
    }

    fn page(cards: Vec<ElementSpec>) -> PageDocument {
        let address = PageAddress::parse("https://aerodrome.finance/dash").unwrap();
        PageDocument::new(address, "Aerodrome", &ElementSpec::new("body").children(cards))
    }

    #[test]
    fn test_alm_position_is_managed() {
        let alm_href = format!("{WETH_USDC}&alm=true");
        let snapshot = AerodromeExtractor
            .extract(
                &page(vec![card(
                    &alm_href,
                    &["Deposited", "~$1,500.25", "Range 1800 - 2600", "Current 3000", "APR 22.5%"],
                )]),
                Utc::now(),
            )
            .unwrap();

        let position = &snapshot.positions[0];
        assert_eq!(position.pair.as_deref(), Some("WETH/USDC"));
        assert_eq!(position.balance, Some(dec!(1500.25)));
        assert!(position.is_automated);
        assert_eq!(position.range_min, None);
        assert_eq!(position.range_max, None);
        assert_eq!(position.in_range, Some(true));
        assert_eq!(position.range_status, Some(RangeStatus::AlmManaged));
        assert_eq!(snapshot.in_range_count, 1);
    }

    #[test]
    fn test_alm_detected_from_text_markers() {
        for marker in ["ALM", "Automated"] {
            let snapshot = AerodromeExtractor
                .extract(
                    &page(vec![card(
                        WETH_USDC,
                        &["Deposited", "~$250.00", marker, "Range 1800 - 2600", "Current 3000"],
                    )]),
                    Utc::now(),
                )
                .unwrap();

            let position = &snapshot.positions[0];
            assert!(position.is_automated, "marker {marker}");
            assert_eq!(position.range_min, None);
            assert_eq!(position.current_price, None);
            assert_eq!(position.range_status, Some(RangeStatus::AlmManaged));
        }
    }

    #[test]
    fn test_manual_position_with_rewards() {
        let snapshot = AerodromeExtractor
            .extract(
                &page(vec![card(
                    WETH_USDC,
                    &[
                        "Deposited",
                        "~$800.00",
                        "Range 1800.5 - 2600.5",
                        "Current 2000.0",
                        "APR 12.1%",
                        "Boosted APR 30.2%",
                        "Trading Fees",
                        "1.25 USDC",
                        "Emissions",
                        "3.5 AERO",
                    ],
                )]),
                Utc::now(),
            )
            .unwrap();

        let position = &snapshot.positions[0];
        assert!(!position.is_automated);
        assert_eq!(position.apy, Some(dec!(30.2)));
        assert_eq!(position.pending_yield, Some(dec!(4.75)));
        assert_eq!(position.range_min, Some(dec!(1800.5)));
        assert_eq!(position.range_max, Some(dec!(2600.5)));
        assert_eq!(position.current_price, Some(dec!(2000.0)));
        assert_eq!(position.range_status, Some(RangeStatus::InRange));
    }

    #[test]
    fn test_duplicate_pairs_keep_largest_and_drop_dust() {
        let cheap = card(WETH_USDC, &["Deposited", "~$10.00", "Range 1.5 - 2.5", "Current 2.0"]);
        let big = card(WETH_USDC, &["Deposited", "~$900.00", "Range 1.5 - 2.5", "Current 2.0"]);
        let dust = card(
            "/deposit?token0=0x940181a94a35a4569e4529a3cdfb74e38fd98631&token1=0x833589fcd6edb6e08f4c7c32d4f71b54bda02913",
            &["Deposited", "~$0.00"],
        );
        let snapshot = AerodromeExtractor
            .extract(&page(vec![cheap, big, dust]), Utc::now())
            .unwrap();
        assert_eq!(snapshot.position_count, 1);
        assert_eq!(snapshot.positions[0].balance, Some(dec!(900.00)));
        assert_eq!(snapshot.positions[0].range_status, Some(RangeStatus::InRange));
    }

    #[test]
    fn test_unknown_token_symbol() {
        assert_eq!(base_token_symbol("0xABCDEF0123"), "Token0xabcd");
        assert_eq!(
            base_token_symbol("0x833589FCD6EDB6E08F4C7C32D4F71B54BDA02913"),
            "USDC"
        );
    }
}

//! Views across stored captures: the latest position per pool and
//! aggregate statistics over them.

use chrono::{DateTime, Utc};
use lp_watch_domain::{Capture, PositionRecord, Protocol};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Most recent observation of every `(protocol, pair)`, ordered by protocol then pair.
///
/// Positions without a pair cannot be tracked across captures and are skipped.
pub fn latest_positions(captures: &[Capture]) -> Vec<PositionRecord> {
    let mut latest: HashMap<(Protocol, String), (DateTime<Utc>, PositionRecord)> = HashMap::new();

    for capture in captures {
        for record in PositionRecord::from_capture(capture) {
            let Some(pair) = record.position.pair.clone().filter(|p| !p.is_empty()) else {
                continue;
            };
            let key = (record.protocol, pair);
            let newer = latest
                .get(&key)
                .is_none_or(|(seen_at, _)| capture.timestamp > *seen_at);
            if newer {
                latest.insert(key, (capture.timestamp, record));
            }
        }
    }

    let mut entries: Vec<_> = latest.into_iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    entries.into_iter().map(|(_, (_, record))| record).collect()
}

/// Aggregate figures over a set of positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioStats {
    pub total_positions: usize,
    pub in_range_count: usize,
    pub out_of_range_count: usize,
    /// Sum of known balances in USD.
    pub total_value: Decimal,
    pub total_pending_yield: Decimal,
    /// Mean over positions that report an APY.
    pub avg_apy: Option<Decimal>,
    pub protocols: Vec<Protocol>,
    pub pairs: Vec<String>,
}

impl PortfolioStats {
    pub fn from_positions(records: &[PositionRecord]) -> Self {
        let positions = records.iter().map(|r| &r.position);

        let apys: Vec<Decimal> = positions.clone().filter_map(|p| p.apy).collect();
        let avg_apy = (!apys.is_empty())
            .then(|| saturating_total(apys.iter().copied()) / Decimal::from(apys.len()));

        let protocols: BTreeSet<Protocol> = records.iter().map(|r| r.protocol).collect();
        let pairs: BTreeSet<String> = positions.clone().filter_map(|p| p.pair.clone()).collect();

        Self {
            total_positions: records.len(),
            in_range_count: positions.clone().filter(|p| p.is_in_range()).count(),
            out_of_range_count: positions.clone().filter(|p| p.is_out_of_range()).count(),
            total_value: saturating_total(positions.clone().filter_map(|p| p.balance)),
            total_pending_yield: saturating_total(positions.filter_map(|p| p.pending_yield)),
            avg_apy,
            protocols: protocols.into_iter().collect(),
            pairs: pairs.into_iter().collect(),
        }
    }
}

/// Sum that pins at the `Decimal` limits instead of overflowing.
fn saturating_total(values: impl Iterator<Item = Decimal>) -> Decimal {
    values.fold(Decimal::ZERO, Decimal::saturating_add)
}

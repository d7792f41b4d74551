use crate::structs::{
    CountryCode, EnrichedRecord, RankEntry, RankMetric, RankMode, RankedTradeRecord, Role,
    TradeRecord, TransformConfig,
};
use log::debug;
use std::collections::{BTreeMap, HashMap};

/// Sums `metric` per country on one side of the flows.
pub fn totals<T: AsRef<TradeRecord>>(
    records: &[T],
    role: Role,
    metric: RankMetric,
) -> BTreeMap<CountryCode, f64> {
    let mut totals = BTreeMap::new();
    for record in records {
        let trade = record.as_ref();
        let code = match role {
            Role::Exporter => trade.exporter,
            Role::Importer => trade.importer,
        };
        *totals.entry(code).or_insert(0.0) += metric.of(trade);
    }
    totals
}

/// Exports plus imports per country.
pub fn combined_totals<T: AsRef<TradeRecord>>(
    records: &[T],
    metric: RankMetric,
) -> BTreeMap<CountryCode, f64> {
    let mut combined = totals(records, Role::Exporter, metric);
    for (code, total) in totals(records, Role::Importer, metric) {
        *combined.entry(code).or_insert(0.0) += total;
    }
    combined
}

/// Orders countries by total, largest first, and numbers them from 1.
///
/// Equal totals are ordered by country code ascending, so the ranks are always
/// exactly `1..=totals.len()` and the same input always gives the same table.
pub fn rank_table(totals: &BTreeMap<CountryCode, f64>) -> Vec<RankEntry> {
    let mut entries: Vec<(CountryCode, f64)> = totals.iter().map(|(c, t)| (*c, *t)).collect();
    entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
        .into_iter()
        .zip(1u32..)
        .map(|((code, total), rank)| RankEntry { code, total, rank })
        .collect()
}

fn rank_lookup(table: &[RankEntry]) -> HashMap<CountryCode, u32> {
    table.iter().map(|entry| (entry.code, entry.rank)).collect()
}

/// Attaches exporter and importer ranks to every record.
///
/// Output has one row per input row, sorted by exporter rank then importer rank
/// (stable, so rows of the same pair keep their input order).
pub fn rank(records: &[EnrichedRecord], config: &TransformConfig) -> Vec<RankedTradeRecord> {
    let (exporter_ranks, importer_ranks) = match config.mode {
        RankMode::Separate => {
            let exporters = rank_table(&totals(records, Role::Exporter, config.metric));
            let importers = rank_table(&totals(records, Role::Importer, config.metric));
            debug!(
                "Ranked {} exporters and {} importers by {:?}",
                exporters.len(),
                importers.len(),
                config.metric
            );
            (rank_lookup(&exporters), rank_lookup(&importers))
        }
        RankMode::Combined => {
            let table = rank_table(&combined_totals(records, config.metric));
            debug!("Ranked {} countries by combined {:?}", table.len(), config.metric);
            let lookup = rank_lookup(&table);
            (lookup.clone(), lookup)
        }
    };

    // every code seen in `records` has an entry in both lookups
    let mut ranked: Vec<RankedTradeRecord> = records
        .iter()
        .map(|record| RankedTradeRecord {
            trade: record.trade,
            exporter_name: record.exporter_name.clone(),
            importer_name: record.importer_name.clone(),
            exporter_rank: exporter_ranks[&record.trade.exporter],
            importer_rank: importer_ranks[&record.trade.importer],
        })
        .collect();
    ranked.sort_by_key(|r| (r.exporter_rank, r.importer_rank));
    ranked
}

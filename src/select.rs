use crate::rank::{rank_table, totals};
use crate::structs::{
    CountryCode, EnrichedRecord, HeatmapCell, REST_OF_WORLD_CODE, REST_OF_WORLD_NAME, RankMetric,
    RankedTradeRecord, Role,
};
use log::debug;
use std::collections::{BTreeMap, HashSet};

/// Rows where both partners are among the `n` best ranked countries.
pub fn top_n(records: &[RankedTradeRecord], n: usize) -> Vec<RankedTradeRecord> {
    let limit = u32::try_from(n).unwrap_or(u32::MAX);
    records
        .iter()
        .filter(|r| r.exporter_rank <= limit && r.importer_rank <= limit)
        .cloned()
        .collect()
}

/// Keeps the `n` largest exporters and `n` largest importers and merges every
/// other partner into a single "ROW" country.
///
/// Largest is judged on the input by `metric`. Exporters are merged first, per
/// `(year, importer, product)`, then importers per `(year, exporter, product)`,
/// so flows between two small partners end up in a ROW to ROW row. Kept rows
/// stay in input order and merged rows follow in key order.
pub fn collapse_rest_of_world(
    records: &[EnrichedRecord],
    n: usize,
    metric: RankMetric,
) -> Vec<EnrichedRecord> {
    let top_exporters = largest(records, Role::Exporter, metric, n);
    let top_importers = largest(records, Role::Importer, metric, n);

    let merged = merge_others(records.to_vec(), &top_exporters, Role::Exporter);
    let merged = merge_others(merged, &top_importers, Role::Importer);
    debug!(
        "Collapsed {} rows into {} with {} partners kept per role",
        records.len(),
        merged.len(),
        n
    );
    merged
}

fn largest(
    records: &[EnrichedRecord],
    role: Role,
    metric: RankMetric,
    n: usize,
) -> HashSet<CountryCode> {
    rank_table(&totals(records, role, metric))
        .into_iter()
        .take(n)
        .map(|entry| entry.code)
        .collect()
}

fn merge_others(
    records: Vec<EnrichedRecord>,
    keep: &HashSet<CountryCode>,
    role: Role,
) -> Vec<EnrichedRecord> {
    let mut kept = Vec::with_capacity(records.len());
    let mut merged: BTreeMap<(i32, CountryCode, u32), EnrichedRecord> = BTreeMap::new();

    for record in records {
        let (code, partner) = match role {
            Role::Exporter => (record.trade.exporter, record.trade.importer),
            Role::Importer => (record.trade.importer, record.trade.exporter),
        };
        if keep.contains(&code) {
            kept.push(record);
            continue;
        }

        let key = (record.trade.year, partner, record.trade.product);
        let (value, quantity) = (record.trade.value, record.trade.quantity);
        merged
            .entry(key)
            .and_modify(|row| {
                row.trade.value += value;
                row.trade.quantity += quantity;
            })
            .or_insert_with(|| relabel(record, role));
    }

    kept.extend(merged.into_values());
    kept
}

fn relabel(mut record: EnrichedRecord, role: Role) -> EnrichedRecord {
    match role {
        Role::Exporter => {
            record.trade.exporter = REST_OF_WORLD_CODE;
            record.exporter_name = REST_OF_WORLD_NAME.to_string();
        }
        Role::Importer => {
            record.trade.importer = REST_OF_WORLD_CODE;
            record.importer_name = REST_OF_WORLD_NAME.to_string();
        }
    }
    record
}

/// Projects ranked rows onto the exporter/importer/quantity triples a heatmap draws.
pub fn heatmap_cells(records: &[RankedTradeRecord]) -> Vec<HeatmapCell> {
    records
        .iter()
        .map(|r| HeatmapCell {
            exporter_name: r.exporter_name.clone(),
            importer_name: r.importer_name.clone(),
            quantity: r.trade.quantity,
        })
        .collect()
}

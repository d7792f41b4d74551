use crate::enrich::{CountryDirectory, enrich};
use crate::error::Result;
use crate::extract::load_trades;
use crate::rank::rank;
use crate::select::{collapse_rest_of_world, top_n};
use crate::structs::{DatasetSummary, RankedTradeRecord, TradeRecord, TransformConfig};
use log::debug;
use std::collections::HashSet;
use std::path::Path;

/// Loads a BACI extract and the country directory from disk and returns the ranked table.
///
/// # Arguments
///
/// * `trade_path` - BACI CSV with the `t,i,j,k,v,q` columns
/// * `directory_path` - BACI `country_codes` CSV
/// * `config` - product filter, ranking and selection settings
///
/// # Errors
///
/// Returns `PipelineError::SourceUnavailable` when either file is missing or unreadable,
/// `PipelineError::EmptyResult` when the product code matches no row and
/// `PipelineError::MalformedRow` for an invalid row in strict mode.
pub fn process_data(
    trade_path: &Path,
    directory_path: &Path,
    config: &TransformConfig,
) -> Result<Vec<RankedTradeRecord>> {
    let extract = load_trades(trade_path, config)?;
    println!(
        "Loaded {} of {} rows for product {} ({} malformed)",
        extract.records.len(),
        extract.rows_read,
        config.product,
        extract.malformed
    );
    let directory = CountryDirectory::from_path(directory_path, &config.names)?;
    Ok(transform(&extract.records, &directory, config))
}

/// Enriches, optionally collapses, ranks and optionally trims already loaded records.
pub fn transform(
    records: &[TradeRecord],
    directory: &CountryDirectory,
    config: &TransformConfig,
) -> Vec<RankedTradeRecord> {
    let enriched = enrich(records, directory);
    if !enriched.unknown_codes.is_empty() {
        debug!(
            "{} country codes fell back to placeholders",
            enriched.unknown_codes.len()
        );
    }

    let rows = match config.rest_of_world {
        Some(n) => collapse_rest_of_world(&enriched.records, n, config.metric),
        None => enriched.records,
    };
    let ranked = rank(&rows, config);

    match config.top_n {
        Some(n) => {
            let selected = top_n(&ranked, n);
            debug!("Top {} selection kept {} of {} rows", n, selected.len(), ranked.len());
            selected
        }
        None => ranked,
    }
}

/// Counts distinct partners and sums the flows of a ranked table.
pub fn summarize(records: &[RankedTradeRecord]) -> DatasetSummary {
    let exporters: HashSet<_> = records.iter().map(|r| r.trade.exporter).collect();
    let importers: HashSet<_> = records.iter().map(|r| r.trade.importer).collect();
    let pairs: HashSet<_> = records
        .iter()
        .map(|r| (r.trade.exporter, r.trade.importer))
        .collect();

    DatasetSummary {
        rows: records.len(),
        exporters: exporters.len(),
        importers: importers.len(),
        pairs: pairs.len(),
        total_value: records.iter().map(|r| r.trade.value).sum(),
        total_quantity: records.iter().map(|r| r.trade.quantity).sum(),
    }
}

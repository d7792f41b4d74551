use crate::error::{PipelineError, Result};
use crate::structs::{CountryCode, TradeRecord, TransformConfig};
use chrono::Datelike;
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, warn};
use serde::Deserialize;
use std::{fs::File, io::Read, path::Path};

/// First year covered by any BACI release.
pub const FIRST_YEAR: i32 = 1995;

/// Short column names used by the BACI dump, in file order.
const REQUIRED_COLUMNS: [&str; 6] = ["t", "i", "j", "k", "v", "q"];

/// One row exactly as BACI writes it.
#[derive(Debug, Deserialize)]
struct RawRow {
    t: i32,
    i: CountryCode,
    j: CountryCode,
    k: u32,
    v: f64,
    // BACI writes "NA" for unknown quantities
    #[serde(deserialize_with = "csv::invalid_option")]
    q: Option<f64>,
}

/// Rows kept from an extract together with load counters.
#[derive(Debug, Clone, Default)]
pub struct Extract {
    pub records: Vec<TradeRecord>,
    pub rows_read: usize,
    pub malformed: usize,
    pub missing_quantities: usize,
}

/// Loads the trade flows for `config.product` from a BACI CSV file.
///
/// # Errors
///
/// Returns `PipelineError::SourceUnavailable` if the file cannot be opened, lacks one of
/// the `t,i,j,k,v,q` columns or fails mid-read, `PipelineError::EmptyResult` if no row
/// carries the product code, and `PipelineError::MalformedRow` for the first invalid row
/// when `config.strict` is set.
pub fn load_trades(path: &Path, config: &TransformConfig) -> Result<Extract> {
    debug!("Reading BACI extract: {}", path.display());
    let file = File::open(path).map_err(|err| PipelineError::unavailable(path, err))?;
    read_from(file, path, config)
}

/// Same as [`load_trades`] over any reader.
pub fn read_trades<R: Read>(reader: R, config: &TransformConfig) -> Result<Extract> {
    read_from(reader, Path::new("<stream>"), config)
}

fn read_from<R: Read>(reader: R, origin: &Path, config: &TransformConfig) -> Result<Extract> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = reader
        .headers()
        .map_err(|err| PipelineError::unavailable(origin, err))?
        .clone();
    check_columns(&headers, origin)?;

    let max_year = chrono::Local::now().year();
    let mut extract = Extract::default();

    for result in reader.records() {
        extract.rows_read += 1;
        let row = match result {
            Ok(row) => row,
            Err(err) if matches!(err.kind(), csv::ErrorKind::Io(_)) => {
                return Err(PipelineError::unavailable(origin, err));
            }
            Err(err) => {
                let line = err.position().map_or(0, |pos| pos.line());
                reject(config.strict, &mut extract.malformed, line, err.to_string())?;
                continue;
            }
        };
        let line = row.position().map_or(0, |pos| pos.line());

        let raw: RawRow = match row.deserialize(Some(&headers)) {
            Ok(raw) => raw,
            Err(err) => {
                reject(config.strict, &mut extract.malformed, line, err.to_string())?;
                continue;
            }
        };

        match validate(raw, max_year) {
            Ok((record, quantity_known)) => {
                if record.product != config.product {
                    continue;
                }
                if !quantity_known {
                    extract.missing_quantities += 1;
                }
                extract.records.push(record);
            }
            Err(reason) => reject(config.strict, &mut extract.malformed, line, reason)?,
        }
    }

    debug!(
        "Read {} rows, {} matched product {}",
        extract.rows_read,
        extract.records.len(),
        config.product
    );
    if extract.malformed > 0 {
        warn!("Skipped {} malformed rows", extract.malformed);
    }
    if extract.missing_quantities > 0 {
        debug!(
            "{} rows had no quantity, counted as 0",
            extract.missing_quantities
        );
    }

    if extract.records.is_empty() {
        return Err(PipelineError::EmptyResult {
            product: config.product,
        });
    }
    Ok(extract)
}

fn check_columns(headers: &StringRecord, origin: &Path) -> Result<()> {
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| header == column) {
            return Err(PipelineError::unavailable(
                origin,
                format!("missing column '{column}'"),
            ));
        }
    }
    Ok(())
}

fn reject(strict: bool, malformed: &mut usize, line: u64, reason: String) -> Result<()> {
    if strict {
        return Err(PipelineError::MalformedRow { line, reason });
    }
    debug!("Skipping line {}: {}", line, reason);
    *malformed += 1;
    Ok(())
}

/// Checks one row against the record invariants. The flag is false when the
/// quantity was missing and replaced by zero.
fn validate(raw: RawRow, max_year: i32) -> std::result::Result<(TradeRecord, bool), String> {
    if !(FIRST_YEAR..=max_year).contains(&raw.t) {
        return Err(format!("year {} out of range", raw.t));
    }
    if !raw.v.is_finite() || raw.v < 0.0 {
        return Err(format!("invalid value {}", raw.v));
    }
    let (quantity, known) = match raw.q {
        Some(q) if q.is_nan() => (0.0, false),
        Some(q) if q.is_infinite() || q < 0.0 => {
            return Err(format!("invalid quantity {}", q));
        }
        Some(q) => (q, true),
        None => (0.0, false),
    };

    let record = TradeRecord {
        year: raw.t,
        exporter: raw.i,
        importer: raw.j,
        product: raw.k,
        value: raw.v,
        quantity,
    };
    Ok((record, known))
}

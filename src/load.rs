use crate::error::Result;
use crate::structs::RankedTradeRecord;
use arrow_array::{Float64Array, Int32Array, RecordBatch, StringArray, UInt32Array};
use arrow_schema::{DataType, Field, Schema};
use csv::Writer;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use serde::Serialize;
use std::{fs::File, path::Path, sync::Arc};

const COLUMNS: [&str; 10] = [
    "year",
    "exporter",
    "importer",
    "product",
    "value",
    "quantity",
    "exporter_name",
    "importer_name",
    "exporter_rank",
    "importer_rank",
];

/// Writes the ranked table to a CSV file, one line per trade flow.
///
/// Amounts are written at full precision so the file reloads to the same table.
///
/// # Errors
/// Returns error if file cannot be created or written to.
pub fn write_csv(results: &[RankedTradeRecord], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record(COLUMNS)?;
    for row in results {
        writer.write_record(&[
            row.trade.year.to_string(),
            row.trade.exporter.to_string(),
            row.trade.importer.to_string(),
            row.trade.product.to_string(),
            row.trade.value.to_string(),
            row.trade.quantity.to_string(),
            row.exporter_name.clone(),
            row.importer_name.clone(),
            row.exporter_rank.to_string(),
            row.importer_rank.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes any serializable rows as a pretty-formatted JSON array.
///
/// # Errors
/// Returns error if file cannot be created or serialization fails.
pub fn write_json<T: Serialize>(results: &[T], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    serde_json::to_writer_pretty(file, results)?;
    Ok(())
}

/// Writes the ranked table to a columnar Parquet file using Arrow format.
///
/// # Errors
/// Returns error if file cannot be created, schema is invalid, or Arrow operations fail.
pub fn write_parquet(results: &[RankedTradeRecord], output_path: &Path) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new(COLUMNS[0], DataType::Int32, false),
        Field::new(COLUMNS[1], DataType::Int32, false),
        Field::new(COLUMNS[2], DataType::Int32, false),
        Field::new(COLUMNS[3], DataType::UInt32, false),
        Field::new(COLUMNS[4], DataType::Float64, false),
        Field::new(COLUMNS[5], DataType::Float64, false),
        Field::new(COLUMNS[6], DataType::Utf8, false),
        Field::new(COLUMNS[7], DataType::Utf8, false),
        Field::new(COLUMNS[8], DataType::UInt32, false),
        Field::new(COLUMNS[9], DataType::UInt32, false),
    ]));

    let years: Int32Array = results.iter().map(|r| r.trade.year).collect();
    let exporters: Int32Array = results.iter().map(|r| r.trade.exporter).collect();
    let importers: Int32Array = results.iter().map(|r| r.trade.importer).collect();
    let products: UInt32Array = results.iter().map(|r| r.trade.product).collect();
    let values: Float64Array = results.iter().map(|r| r.trade.value).collect();
    let quantities: Float64Array = results.iter().map(|r| r.trade.quantity).collect();
    let exporter_names =
        StringArray::from_iter_values(results.iter().map(|r| r.exporter_name.as_str()));
    let importer_names =
        StringArray::from_iter_values(results.iter().map(|r| r.importer_name.as_str()));
    let exporter_ranks: UInt32Array = results.iter().map(|r| r.exporter_rank).collect();
    let importer_ranks: UInt32Array = results.iter().map(|r| r.importer_rank).collect();

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(years),
            Arc::new(exporters),
            Arc::new(importers),
            Arc::new(products),
            Arc::new(values),
            Arc::new(quantities),
            Arc::new(exporter_names),
            Arc::new(importer_names),
            Arc::new(exporter_ranks),
            Arc::new(importer_ranks),
        ],
    )?;

    let file = File::create(output_path)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

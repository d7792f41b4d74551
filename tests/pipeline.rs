use arrow_array::{Float64Array, StringArray, UInt32Array};
use oak_trade::{
    PipelineError, RankMode, RankedTradeRecord, TransformConfig, heatmap_cells, process_data,
    write_csv, write_json, write_parquet,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::collections::{BTreeSet, HashMap};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const TRADES: &str = "\
t,i,j,k,v,q
2023,842,156,440791,270331.285,170800.681
2023,842,191,440791,  8120.5,   4410.2
2023,842,251,440791, 15002.75,          NA
2023,251,156,440791, 40210.0,  30117.0
2023,251,276,440791, 12000.0,   9000.0
2023,276,251,440791, 22000.0,  14000.0
2023,516,24,440791,      0.751,      0.121
2023,384,251,440791,   310.0,    200.0
2023,842,156,440399, 99999.0,  99999.0
2023,999,276,440791,     5.0,      1.0
2023,842,156,440791,    oops,      1.0
";

const COUNTRIES: &str = "\
country_code,country_name,country_iso2,country_iso3
24,Angola,AO,AGO
156,China,CN,CHN
191,Croatia,HR,HRV
251,France,FR,FRA
276,Germany,DE,DEU
384,CÃ´te d'Ivoire,CI,CIV
516,Namibia,NA,NAM
842,USA,US,USA
";

struct Fixture {
    dir: TempDir,
    trades: PathBuf,
    countries: PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let trades = dir.path().join("BACI_HS22_Y2023_V202501.csv");
    let countries = dir.path().join("country_codes_V202501.csv");
    fs::write(&trades, TRADES).unwrap();
    fs::write(&countries, COUNTRIES).unwrap();
    Fixture {
        dir,
        trades,
        countries,
    }
}

fn run(fixture: &Fixture, config: &TransformConfig) -> Vec<RankedTradeRecord> {
    process_data(&fixture.trades, &fixture.countries, config).unwrap()
}

fn exporter_totals(records: &[RankedTradeRecord]) -> HashMap<i32, f64> {
    let mut totals = HashMap::new();
    for r in records {
        *totals.entry(r.trade.exporter).or_insert(0.0) += r.trade.value;
    }
    totals
}

#[test]
fn every_row_has_requested_product() {
    let fixture = fixture();
    let ranked = run(&fixture, &TransformConfig::default());
    // 9 valid oak rows, one other product, one malformed
    assert_eq!(ranked.len(), 9);
    assert!(ranked.iter().all(|r| r.trade.product == 440791));
}

#[test]
fn exporter_ranks_are_dense_and_ordered_by_total() {
    let fixture = fixture();
    let ranked = run(&fixture, &TransformConfig::default());

    let exporters: BTreeSet<i32> = ranked.iter().map(|r| r.trade.exporter).collect();
    let ranks: BTreeSet<u32> = ranked.iter().map(|r| r.exporter_rank).collect();
    assert_eq!(ranks, (1..=exporters.len() as u32).collect::<BTreeSet<u32>>());

    let totals = exporter_totals(&ranked);
    let leader = ranked.iter().find(|r| r.exporter_rank == 1).unwrap();
    assert_eq!(leader.exporter_name, "USA");
    let leader_total = totals[&leader.trade.exporter];
    assert!(totals.values().all(|total| leader_total >= *total));

    let namibia = ranked.iter().find(|r| r.exporter_name == "Namibia").unwrap();
    assert!(namibia.exporter_rank > leader.exporter_rank);
}

#[test]
fn rerunning_gives_identical_output() {
    let fixture = fixture();
    let config = TransformConfig::default();
    assert_eq!(run(&fixture, &config), run(&fixture, &config));
}

#[test]
fn unknown_code_keeps_placeholder_name() {
    let fixture = fixture();
    let ranked = run(&fixture, &TransformConfig::default());
    let unknown = ranked.iter().find(|r| r.trade.exporter == 999).unwrap();
    assert_eq!(unknown.exporter_name, "999");
    assert_eq!(unknown.importer_name, "Germany");
}

#[test]
fn reference_names_are_cleaned() {
    let fixture = fixture();
    let ranked = run(&fixture, &TransformConfig::default());
    assert!(ranked.iter().any(|r| r.exporter_name == "Côte d'Ivoire"));
}

#[test]
fn strict_mode_fails_on_malformed_row() {
    let fixture = fixture();
    let config = TransformConfig {
        strict: true,
        ..TransformConfig::default()
    };
    match process_data(&fixture.trades, &fixture.countries, &config) {
        Err(PipelineError::MalformedRow { line, .. }) => assert_eq!(line, 12),
        other => panic!("expected MalformedRow, got {:?}", other),
    }
}

#[test]
fn wrong_product_code_is_reported() {
    let fixture = fixture();
    let config = TransformConfig {
        product: 123456,
        ..TransformConfig::default()
    };
    assert!(matches!(
        process_data(&fixture.trades, &fixture.countries, &config),
        Err(PipelineError::EmptyResult { product: 123456 })
    ));
}

#[test]
fn missing_sources_are_reported() {
    let fixture = fixture();
    let missing = fixture.dir.path().join("missing.csv");
    let config = TransformConfig::default();
    assert!(matches!(
        process_data(&missing, &fixture.countries, &config),
        Err(PipelineError::SourceUnavailable { .. })
    ));
    assert!(matches!(
        process_data(&fixture.trades, &missing, &config),
        Err(PipelineError::SourceUnavailable { .. })
    ));
}

#[test]
fn combined_mode_ranks_each_country_once() {
    let fixture = fixture();
    let config = TransformConfig {
        mode: RankMode::Combined,
        ..TransformConfig::default()
    };
    let ranked = run(&fixture, &config);
    let mut seen: HashMap<i32, u32> = HashMap::new();
    for r in &ranked {
        for (code, rank) in [
            (r.trade.exporter, r.exporter_rank),
            (r.trade.importer, r.importer_rank),
        ] {
            assert_eq!(*seen.entry(code).or_insert(rank), rank);
        }
    }
}

#[test]
fn rest_of_world_and_top_n() {
    let fixture = fixture();
    let config = TransformConfig {
        rest_of_world: Some(2),
        top_n: Some(3),
        ..TransformConfig::default()
    };
    let ranked = run(&fixture, &config);
    assert!(ranked.iter().any(|r| r.exporter_name == "ROW"));
    assert!(
        ranked
            .iter()
            .all(|r| r.exporter_rank <= 3 && r.importer_rank <= 3)
    );
}

fn read_csv_rows(path: &Path) -> Vec<csv::StringRecord> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    assert_eq!(
        reader.headers().unwrap().iter().collect::<Vec<_>>(),
        [
            "year",
            "exporter",
            "importer",
            "product",
            "value",
            "quantity",
            "exporter_name",
            "importer_name",
            "exporter_rank",
            "importer_rank"
        ]
    );
    reader.records().map(|r| r.unwrap()).collect()
}

#[test]
fn writers_produce_readable_files() {
    let fixture = fixture();
    let ranked = run(&fixture, &TransformConfig::default());
    let out = fixture.dir.path().join("out");
    fs::create_dir_all(&out).unwrap();

    let csv_path = out.join("baci_dataset.csv");
    write_csv(&ranked, &csv_path).unwrap();
    let rows = read_csv_rows(&csv_path);
    assert_eq!(rows.len(), ranked.len());
    assert_eq!(&rows[0][6], ranked[0].exporter_name.as_str());
    assert_eq!(rows[0][4].parse::<f64>().unwrap(), ranked[0].trade.value);

    let json_path = out.join("baci_dataset.json");
    write_json(&ranked, &json_path).unwrap();
    let json: Vec<serde_json::Value> =
        serde_json::from_reader(File::open(&json_path).unwrap()).unwrap();
    assert_eq!(json.len(), ranked.len());
    assert_eq!(json[0]["exporter_name"], "USA");
    assert_eq!(json[0]["exporter_rank"], 1);
    assert_eq!(json[0]["product"], 440791);

    let cells_path = out.join("baci_dataset_cells.json");
    write_json(&heatmap_cells(&ranked), &cells_path).unwrap();
    let cells: Vec<serde_json::Value> =
        serde_json::from_reader(File::open(&cells_path).unwrap()).unwrap();
    assert_eq!(cells.len(), ranked.len());
    assert_eq!(cells[0].as_object().unwrap().len(), 3);

    let parquet_path = out.join("baci_dataset.parquet");
    write_parquet(&ranked, &parquet_path).unwrap();
    let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&parquet_path).unwrap())
        .unwrap()
        .build()
        .unwrap();
    let batches: Vec<_> = reader.map(|b| b.unwrap()).collect();
    let total_rows: usize = batches.iter().map(|b| b.num_rows()).sum();
    assert_eq!(total_rows, ranked.len());

    let first = &batches[0];
    let names = first
        .column_by_name("exporter_name")
        .unwrap()
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    let ranks = first
        .column_by_name("exporter_rank")
        .unwrap()
        .as_any()
        .downcast_ref::<UInt32Array>()
        .unwrap();
    let values = first
        .column_by_name("value")
        .unwrap()
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert_eq!(names.value(0), ranked[0].exporter_name);
    assert_eq!(ranks.value(0), ranked[0].exporter_rank);
    assert_eq!(values.value(0), ranked[0].trade.value);
}

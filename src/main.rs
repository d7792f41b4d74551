use clap::Parser;
use log::debug;
use oak_trade::paths::{self, INPUT_DIR_ENV, OUTPUT_DIR_ENV};
use oak_trade::rank::{rank_table, totals};
use oak_trade::{
    CountryCode, NameOptions, OAK_SAWNWOOD, PipelineError, RankMetric, RankMode, Role,
    SimpleLogger, TransformConfig, heatmap_cells, process_data, split_thousands, summarize,
    write_csv, write_json, write_parquet,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

static LOGGER: SimpleLogger = SimpleLogger;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the unzipped BACI files
    #[arg(long, env = INPUT_DIR_ENV, default_value = "input")]
    input_dir: PathBuf,

    /// BACI trade CSV (defaults to the HS22 2023 file inside the input directory)
    #[arg(short, long)]
    input_file: Option<PathBuf>,

    /// BACI country codes CSV (defaults to the file inside the input directory)
    #[arg(long)]
    countries_file: Option<PathBuf>,

    /// Directory receiving the output folder
    #[arg(long, env = OUTPUT_DIR_ENV, default_value = "output")]
    output_dir: PathBuf,

    /// Output base name (will create dir containing .csv, .json, and .parquet files)
    #[arg(short, long, default_value = "baci_dataset")]
    output: String,

    /// HS product code to keep
    #[arg(short, long, default_value_t = OAK_SAWNWOOD)]
    product: u32,

    /// Amount used to rank countries
    #[arg(long, default_value = "value")]
    metric: RankMetric,

    /// Rank exporters and importers separately or on exports + imports
    #[arg(long, default_value = "separate")]
    mode: RankMode,

    /// Fail on the first malformed row instead of skipping it
    #[arg(long, default_value_t = false)]
    strict: bool,

    /// Keep country names exactly as in the reference file
    #[arg(long, default_value_t = false)]
    raw_names: bool,

    /// Keep official long country names
    #[arg(long, default_value_t = false)]
    long_names: bool,

    /// Keep only flows between the N best ranked countries
    #[arg(long)]
    top_n: Option<usize>,

    /// Merge all but the N largest partners per role into ROW
    #[arg(long)]
    rest_of_world: Option<usize>,

    /// Also write the exporter/importer/quantity cells used by heatmaps
    #[arg(long, default_value_t = false)]
    cells: bool,

    /// Log level for output
    #[arg(long, default_value = "false")]
    debug: bool,
}

fn main() -> Result<(), PipelineError> {
    // Initialize timer and logger
    let total_start = Instant::now();
    log::set_logger(&LOGGER).map_err(|err| PipelineError::Data(err.to_string()))?;

    let args = Args::parse();
    if args.debug {
        log::set_max_level(log::LevelFilter::Debug);
    } else {
        log::set_max_level(log::LevelFilter::Info);
    }

    println!("BACI trade ranking pipeline");
    let inputs = paths::resolve_inputs(
        &args.input_dir,
        args.input_file.as_deref(),
        args.countries_file.as_deref(),
    )?;
    debug!(
        "Trades: {} | Countries: {}",
        inputs.trades.display(),
        inputs.countries.display()
    );

    let config = TransformConfig {
        product: args.product,
        metric: args.metric,
        mode: args.mode,
        strict: args.strict,
        names: NameOptions {
            repair_mojibake: !args.raw_names,
            short_names: !args.raw_names && !args.long_names,
        },
        top_n: args.top_n,
        rest_of_world: args.rest_of_world,
    };
    debug!("Transformation configuration: {:?}", config);

    println!("Starting data processing...");
    let processing_start = Instant::now();
    let results = process_data(&inputs.trades, &inputs.countries, &config)?;
    let processing_time = processing_start.elapsed();
    println!(
        "Data processing completed in {:.2?} | Ranked {} records",
        processing_time,
        results.len()
    );

    let output_name = args
        .output
        .split(['/', '\\'])
        .next_back()
        .unwrap_or(&args.output);
    let output_dir = paths::prepare_output(&args.output_dir, output_name)?;
    println!("Writing output files to {}", output_dir.display());
    let io_start = Instant::now();

    let csv_path = output_dir.join(format!("{}.csv", output_name));
    let json_path = output_dir.join(format!("{}.json", output_name));
    let parquet_path = output_dir.join(format!("{}.parquet", output_name));

    write_csv(&results, &csv_path)?;
    debug!("  - {}", csv_path.display());
    write_json(&results, &json_path)?;
    debug!("  - {}", json_path.display());
    write_parquet(&results, &parquet_path)?;
    debug!("  - {}", parquet_path.display());
    if args.cells {
        let cells_path = output_dir.join(format!("{}_cells.json", output_name));
        write_json(&heatmap_cells(&results), &cells_path)?;
        debug!("  - {}", cells_path.display());
    }
    let io_time = io_start.elapsed();
    println!("All files took {:.2?}", io_time);

    let summary = summarize(&results);
    println!(
        "\n{} rows | {} exporters | {} importers | {} pairs",
        split_thousands(summary.rows as f64, 0),
        summary.exporters,
        summary.importers,
        summary.pairs
    );
    println!(
        "Total value {} | Total quantity {}",
        split_thousands(summary.total_value, 2),
        split_thousands(summary.total_quantity, 2)
    );

    let names: HashMap<CountryCode, &str> = results
        .iter()
        .flat_map(|r| {
            [
                (r.trade.exporter, r.exporter_name.as_str()),
                (r.trade.importer, r.importer_name.as_str()),
            ]
        })
        .collect();
    for (role, label) in [(Role::Exporter, "exporters"), (Role::Importer, "importers")] {
        let leaders: Vec<String> = rank_table(&totals(&results, role, config.metric))
            .iter()
            .take(5)
            .map(|entry| {
                let name = names.get(&entry.code).copied().unwrap_or("?");
                format!("{} {}", name, split_thousands(entry.total, 2))
            })
            .collect();
        println!("Top {}: {}", label, leaders.join(", "));
    }

    let total_time = total_start.elapsed();
    debug!(
        "Performance breakdown: Processing={:.1}%, IO={:.1}%",
        (processing_time.as_secs_f64() / total_time.as_secs_f64()) * 100.0,
        (io_time.as_secs_f64() / total_time.as_secs_f64()) * 100.0
    );
    println!("\nPipeline completed successfully in {:.2?}", total_time);
    Ok(())
}

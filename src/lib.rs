pub mod enrich;
pub mod error;
pub mod extract;
pub mod format;
pub mod load;
pub mod paths;
pub mod rank;
pub mod select;
pub mod structs;
pub mod transform;

// Re-export public API
pub use enrich::{CountryDirectory, Enriched, enrich};
pub use error::{PipelineError, Result};
pub use extract::{Extract, load_trades, read_trades};
pub use format::split_thousands;
pub use load::{write_csv, write_json, write_parquet};
pub use rank::{rank, rank_table};
pub use select::{collapse_rest_of_world, heatmap_cells, top_n};
pub use structs::{
    CountryCode, DatasetSummary, EnrichedRecord, HeatmapCell, NameOptions, OAK_SAWNWOOD,
    RankEntry, RankMetric, RankMode, RankedTradeRecord, Role, SimpleLogger, TradeRecord,
    TransformConfig,
};
pub use transform::{process_data, summarize, transform};

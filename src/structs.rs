use log::{Log, Metadata, Record as LogRecord};
use serde::{Deserialize, Serialize};

/// HS22 product code for oak sawnwood.
pub const OAK_SAWNWOOD: u32 = 440791;

/// Numeric country code as used by BACI.
pub type CountryCode = i32;

/// Synthetic code for partners merged into "rest of world".
pub const REST_OF_WORLD_CODE: CountryCode = -1;
pub const REST_OF_WORLD_NAME: &str = "ROW";

/// Simple logger implementation
pub struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &LogRecord) {
        eprintln!("[{}] {}", record.level(), record.args());
    }

    fn flush(&self) {}
}

/// One bilateral trade flow from the BACI extract, with descriptive field names.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub year: i32,
    pub exporter: CountryCode,
    pub importer: CountryCode,
    pub product: u32,
    pub value: f64,
    pub quantity: f64,
}

/// A trade flow with both partners' display names attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub trade: TradeRecord,
    pub exporter_name: String,
    pub importer_name: String,
}

/// A trade flow carrying the exporter's and importer's rank (1 = largest).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedTradeRecord {
    #[serde(flatten)]
    pub trade: TradeRecord,
    pub exporter_name: String,
    pub importer_name: String,
    pub exporter_rank: u32,
    pub importer_rank: u32,
}

impl AsRef<TradeRecord> for TradeRecord {
    fn as_ref(&self) -> &TradeRecord {
        self
    }
}

impl AsRef<TradeRecord> for EnrichedRecord {
    fn as_ref(&self) -> &TradeRecord {
        &self.trade
    }
}

impl AsRef<TradeRecord> for RankedTradeRecord {
    fn as_ref(&self) -> &TradeRecord {
        &self.trade
    }
}

/// Per-country line of a ranking table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankEntry {
    pub code: CountryCode,
    pub total: f64,
    pub rank: u32,
}

/// Minimal payload consumed by heatmap front-ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub exporter_name: String,
    pub importer_name: String,
    pub quantity: f64,
}

/// Which side of a flow a country is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Exporter,
    Importer,
}

/// Quantity being aggregated when ranking countries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum RankMetric {
    #[default]
    Value,
    Quantity,
}

impl RankMetric {
    pub fn of(self, trade: &TradeRecord) -> f64 {
        match self {
            RankMetric::Value => trade.value,
            RankMetric::Quantity => trade.quantity,
        }
    }
}

/// How exporter and importer ranks relate to each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum RankMode {
    /// Exporters and importers are ranked independently
    #[default]
    Separate,
    /// One ranking over exports + imports, shared by both roles
    Combined,
}

/// Clean-up applied to names read from the country directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameOptions {
    pub repair_mojibake: bool,
    pub short_names: bool,
}

impl Default for NameOptions {
    fn default() -> Self {
        Self {
            repair_mojibake: true,
            short_names: true,
        }
    }
}

/// Configuration for data transformation
#[derive(Debug, Clone)]
pub struct TransformConfig {
    pub product: u32,
    pub metric: RankMetric,
    pub mode: RankMode,
    pub strict: bool,
    pub names: NameOptions,
    pub top_n: Option<usize>,
    pub rest_of_world: Option<usize>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            product: OAK_SAWNWOOD,
            metric: RankMetric::Value,
            mode: RankMode::Separate,
            strict: false,
            names: NameOptions::default(),
            top_n: None,
            rest_of_world: None,
        }
    }
}

/// Headline counts of a ranked table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub exporters: usize,
    pub importers: usize,
    pub pairs: usize,
    pub total_value: f64,
    pub total_quantity: f64,
}

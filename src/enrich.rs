use crate::error::{PipelineError, Result};
use crate::structs::{
    CountryCode, EnrichedRecord, NameOptions, REST_OF_WORLD_CODE, REST_OF_WORLD_NAME, TradeRecord,
};
use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};
use std::{fs::File, io::Read, path::Path};

/// Official names that are too long for chart axes.
const SHORT_NAMES: [(&str, &str); 8] = [
    ("China, Hong Kong SAR", "Hong Kong"),
    ("Bolivia (Plurinational State of)", "Bolivia"),
    ("Bosnia Herzegovina", "Bosnia"),
    ("Russian Federation", "Russia"),
    ("Rep. of Korea", "Korea"),
    ("Rep. of Moldova", "Moldova"),
    ("United Arab Emirates", "UAE"),
    ("United Kingdom", "UK"),
];

#[derive(Debug, Deserialize)]
struct CountryRow {
    country_code: CountryCode,
    country_name: String,
}

/// Country code to display name lookup, built once from the BACI reference table.
#[derive(Debug, Clone, Default)]
pub struct CountryDirectory {
    names: HashMap<CountryCode, String>,
}

impl CountryDirectory {
    /// Reads `country_codes_*.csv` from disk.
    pub fn from_path(path: &Path, options: &NameOptions) -> Result<Self> {
        debug!("Reading country directory: {}", path.display());
        let file = File::open(path).map_err(|err| PipelineError::unavailable(path, err))?;
        Self::read_from(file, path, options)
    }

    pub fn from_reader<R: Read>(reader: R, options: &NameOptions) -> Result<Self> {
        Self::read_from(reader, Path::new("<stream>"), options)
    }

    /// Builds a directory from already clean names.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (CountryCode, S)>,
        S: Into<String>,
    {
        Self {
            names: pairs
                .into_iter()
                .map(|(code, name)| (code, name.into()))
                .collect(),
        }
    }

    fn read_from<R: Read>(reader: R, origin: &Path, options: &NameOptions) -> Result<Self> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        let mut names = HashMap::new();
        for row in reader.deserialize::<CountryRow>() {
            let row = row.map_err(|err| PipelineError::unavailable(origin, err))?;
            names.insert(row.country_code, clean_name(&row.country_name, options));
        }
        debug!("Loaded {} country names", names.len());
        Ok(Self { names })
    }

    pub fn name(&self, code: CountryCode) -> Option<&str> {
        self.names.get(&code).map(String::as_str)
    }

    /// Name to display for `code`; unknown codes fall back to the code itself.
    pub fn display_name(&self, code: CountryCode) -> Cow<'_, str> {
        match self.name(code) {
            Some(name) => Cow::Borrowed(name),
            None if code == REST_OF_WORLD_CODE => Cow::Borrowed(REST_OF_WORLD_NAME),
            None => Cow::Owned(code.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Enricher output with the codes that had no directory entry.
#[derive(Debug, Clone, Default)]
pub struct Enriched {
    pub records: Vec<EnrichedRecord>,
    pub unknown_codes: BTreeSet<CountryCode>,
}

/// Attaches exporter and importer names to every record.
///
/// A code missing from the directory never aborts the batch: the row keeps the
/// code as its name and the code is reported in `Enriched::unknown_codes`.
pub fn enrich(records: &[TradeRecord], directory: &CountryDirectory) -> Enriched {
    let mut unknown_codes = BTreeSet::new();
    let mut lookup = |code: CountryCode| {
        if code != REST_OF_WORLD_CODE && directory.name(code).is_none() {
            unknown_codes.insert(code);
        }
        directory.display_name(code).into_owned()
    };

    let records: Vec<EnrichedRecord> = records
        .iter()
        .map(|trade| EnrichedRecord {
            trade: *trade,
            exporter_name: lookup(trade.exporter),
            importer_name: lookup(trade.importer),
        })
        .collect();

    for code in &unknown_codes {
        warn!("Country code {} not in directory, using the code as name", code);
    }
    Enriched {
        records,
        unknown_codes,
    }
}

fn clean_name(raw: &str, options: &NameOptions) -> String {
    let name = if options.repair_mojibake {
        repair_mojibake(raw)
    } else {
        Cow::Borrowed(raw)
    };
    if options.short_names {
        if let Some((_, short)) = SHORT_NAMES.iter().find(|(long, _)| *long == name) {
            return (*short).to_string();
        }
    }
    name.into_owned()
}

/// Undoes UTF-8 text that was decoded as Latin-1 and encoded again, e.g.
/// `"CÃ´te d'Ivoire"` back to `"Côte d'Ivoire"`. Text that does not round-trip
/// is returned as is.
pub fn repair_mojibake(text: &str) -> Cow<'_, str> {
    if text.is_ascii() {
        return Cow::Borrowed(text);
    }
    let latin1: Option<Vec<u8>> = text
        .chars()
        .map(|ch| u8::try_from(u32::from(ch)).ok())
        .collect();
    match latin1.and_then(|bytes| String::from_utf8(bytes).ok()) {
        Some(repaired) => Cow::Owned(repaired),
        None => Cow::Borrowed(text),
    }
}

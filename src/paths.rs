use crate::error::{PipelineError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const TRADE_FILE: &str = "BACI_HS22_Y2023_V202501.csv";
pub const COUNTRY_FILE: &str = "country_codes_V202501.csv";

/// Environment variables that override the default directories.
pub const INPUT_DIR_ENV: &str = "OAK_TRADE_INPUT_DIR";
pub const OUTPUT_DIR_ENV: &str = "OAK_TRADE_OUTPUT_DIR";

/// Input files resolved against the input directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFiles {
    pub trades: PathBuf,
    pub countries: PathBuf,
}

/// Checks that the input directory exists and picks the BACI file names inside it,
/// unless explicit files are given.
pub fn resolve_inputs(
    input_dir: &Path,
    trades: Option<&Path>,
    countries: Option<&Path>,
) -> Result<InputFiles> {
    let needs_dir = trades.is_none() || countries.is_none();
    if needs_dir && !input_dir.is_dir() {
        return Err(PipelineError::unavailable(
            input_dir,
            format!("input directory not found (set ${})", INPUT_DIR_ENV),
        ));
    }
    Ok(InputFiles {
        trades: trades.map_or_else(|| input_dir.join(TRADE_FILE), Path::to_path_buf),
        countries: countries.map_or_else(|| input_dir.join(COUNTRY_FILE), Path::to_path_buf),
    })
}

/// Creates `<output_dir>/<name>` and returns it.
pub fn prepare_output(output_dir: &Path, name: &str) -> Result<PathBuf> {
    let dir = output_dir.join(name);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_baci_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = resolve_inputs(dir.path(), None, None).unwrap();
        assert_eq!(inputs.trades, dir.path().join(TRADE_FILE));
        assert_eq!(inputs.countries, dir.path().join(COUNTRY_FILE));
    }

    #[test]
    fn explicit_files_skip_directory_check() {
        let inputs = resolve_inputs(
            Path::new("/nonexistent"),
            Some(Path::new("a.csv")),
            Some(Path::new("b.csv")),
        )
        .unwrap();
        assert_eq!(inputs.trades, PathBuf::from("a.csv"));
        assert_eq!(inputs.countries, PathBuf::from("b.csv"));
    }

    #[test]
    fn missing_input_dir_is_unavailable() {
        assert!(matches!(
            resolve_inputs(Path::new("/nonexistent/input"), None, None),
            Err(PipelineError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn output_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let out = prepare_output(dir.path(), "baci_dataset").unwrap();
        assert!(out.is_dir());
        assert_eq!(out, dir.path().join("baci_dataset"));
    }
}

use std::env;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use log::debug;
use polars::error::PolarsResult;
use polars::frame::DataFrame;
use polars::prelude::{CsvReadOptions, CsvWriter, SerReader, SerWriter};

use crate::config::PipelineConfig;
use crate::models::polars_err;

pub fn project_root() -> PathBuf {
    match env::var_os("PROJECT_ROOT") {
        Some(val) => PathBuf::from(val),
        None => {
            // Fall back to current directory if PROJECT_ROOT not set
            env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
        }
    }
}

/// Relative paths are taken from the project root, absolute ones pass through.
pub fn resolve_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root().join(path)
    }
}

/// Dump the effective run configuration next to the results.
pub fn write_config_json(config: &PipelineConfig, output_dir: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let config_path = output_dir.join("run_config.json");
    fs::write(&config_path, serde_json::to_string_pretty(config)?)?;
    debug!("Run configuration written to {}", config_path.display());
    Ok(config_path)
}

pub fn read_csv(file_path: &Path) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(file_path.to_path_buf()))?
        .finish()
}

pub fn dataframe_to_csv(df: &mut DataFrame, file_path: &Path, include_header: bool) -> PolarsResult<()> {
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).map_err(|e| polars_err(Box::new(e)))?;
    }
    let mut file = File::create(file_path).map_err(|e| polars_err(Box::new(e)))?;

    CsvWriter::new(&mut file)
        .include_header(include_header)
        .with_separator(b',')
        .finish(df)?;

    debug!("Wrote {} rows to {}", df.height(), file_path.display());
    Ok(())
}

use std::fs;
use std::path::Path;

use polars::prelude::*;
use tracing::{error, info};

use crate::helper_functions::{dataframe_to_csv, read_csv};
use crate::models::{polars_err, BCellRegion, TCellEpitope};
use crate::prediction_tools::hydrophilicity::{is_candidate_bcell, WindowScores};

pub const TCELL_COLUMNS: [&str; 4] = ["Epitope", "Start", "Allele", "Score"];

pub fn tcell_dataframe(epitopes: &[TCellEpitope]) -> PolarsResult<DataFrame> {
    let epitope = Series::new(
        PlSmallStr::from(TCELL_COLUMNS[0]),
        epitopes.iter().map(|e| e.epitope.as_str()).collect::<Vec<&str>>(),
    );
    let start = Series::new(
        PlSmallStr::from(TCELL_COLUMNS[1]),
        epitopes.iter().map(|e| e.start).collect::<Vec<i64>>(),
    );
    let allele = Series::new(
        PlSmallStr::from(TCELL_COLUMNS[2]),
        epitopes.iter().map(|e| e.allele.as_str()).collect::<Vec<&str>>(),
    );
    let score = Series::new(
        PlSmallStr::from(TCELL_COLUMNS[3]),
        epitopes.iter().map(|e| e.score).collect::<Vec<f64>>(),
    );

    DataFrame::new(vec![
        Column::from(epitope),
        Column::from(start),
        Column::from(allele),
        Column::from(score),
    ])
}

/// Write `Epitope,Start,Allele,Score` with no index column.
pub fn export_tcell_epitopes(epitopes: &[TCellEpitope], output_path: &Path) -> PolarsResult<DataFrame> {
    let mut df = tcell_dataframe(epitopes)?;
    dataframe_to_csv(&mut df, output_path, true)?;
    info!("Epitope data exported as '{}'", output_path.display());
    Ok(df)
}

pub fn read_tcell_epitopes(path: &Path) -> PolarsResult<Vec<TCellEpitope>> {
    let df = read_csv(path)?;

    for column in TCELL_COLUMNS {
        if !df.get_column_names().iter().any(|c| c.as_str() == column) {
            error!("Column '{}' missing from {}", column, path.display());
            return Err(PolarsError::ColumnNotFound(column.into()));
        }
    }

    let epitope_col = df.column("Epitope")?.cast(&DataType::String)?;
    let start_col = df.column("Start")?.cast(&DataType::Int64)?;
    let allele_col = df.column("Allele")?.cast(&DataType::String)?;
    let score_col = df.column("Score")?.cast(&DataType::Float64)?;

    let epitopes = epitope_col.str()?;
    let starts = start_col.i64()?;
    let alleles = allele_col.str()?;
    let scores = score_col.f64()?;

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        match (epitopes.get(i), starts.get(i), alleles.get(i), scores.get(i)) {
            (Some(epitope), Some(start), Some(allele), Some(score)) => rows.push(TCellEpitope {
                epitope: epitope.to_string(),
                start,
                allele: allele.to_string(),
                score,
            }),
            _ => {
                return Err(PolarsError::ComputeError(
                    format!("row {} of {} has empty fields", i + 1, path.display()).into(),
                ))
            }
        }
    }

    Ok(rows)
}

/// Per-window profile with the candidate flag, for downstream filtering.
pub fn export_profile(scores: &WindowScores, threshold: f64, output_path: &Path) -> PolarsResult<()> {
    let position = Series::new(
        PlSmallStr::from("position"),
        (0..scores.len() as i64).collect::<Vec<i64>>(),
    );
    let score = Series::new(PlSmallStr::from("score"), scores.scores().to_vec());
    let candidate = Series::new(
        PlSmallStr::from("candidate"),
        scores
            .scores()
            .iter()
            .map(|&s| is_candidate_bcell(s, threshold))
            .collect::<Vec<bool>>(),
    );

    let mut df = DataFrame::new(vec![Column::from(position), Column::from(score), Column::from(candidate)])?;
    dataframe_to_csv(&mut df, output_path, true)?;
    info!("Hydrophilicity profile ({} windows) saved to {}", scores.len(), output_path.display());
    Ok(())
}

pub fn export_bcell_regions(regions: &[BCellRegion], output_path: &Path) -> PolarsResult<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(|e| polars_err(Box::new(e)))?;
    }

    let mut wtr = csv::Writer::from_path(output_path).map_err(|e| polars_err(Box::new(e)))?;
    if regions.is_empty() {
        // serialize() only emits the header alongside the first row
        wtr.write_record([
            "region_start",
            "region_end",
            "residue_start",
            "residue_end",
            "peptide",
            "mean_score",
            "max_score",
        ])
        .map_err(|e| polars_err(Box::new(e)))?;
    }
    for region in regions {
        wtr.serialize(region).map_err(|e| polars_err(Box::new(e)))?;
    }
    wtr.flush().map_err(|e| polars_err(Box::new(e)))?;

    info!("{} B-cell regions saved to {}", regions.len(), output_path.display());
    Ok(())
}

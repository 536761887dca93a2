use std::fs::create_dir_all;
use std::path::Path;

use anyhow::anyhow;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use tracing::{info, warn};

use crate::prediction_tools::hydrophilicity::WindowScores;

fn plot_err<E: std::fmt::Display>(e: E) -> anyhow::Error {
    anyhow!("plotting failed: {}", e)
}

/// Line plot of the window profile with the B-cell threshold as a dashed line.
///
/// Returns `false` without touching the filesystem when there is nothing to plot.
pub fn plot_hydrophilicity_profile(
    scores: &WindowScores,
    threshold: f64,
    protein_label: &str,
    output_path: &Path,
) -> anyhow::Result<bool> {
    if scores.is_empty() {
        warn!("Profile for {} is empty, no plot written", protein_label);
        return Ok(false);
    }
    if let Some(parent) = output_path.parent() {
        create_dir_all(parent)?;
    }

    let caption_font = ("sans-serif bold", 26);
    let axis_font = ("sans-serif", 20);
    let label_font = ("sans-serif", 16);

    // pad the y range so the threshold line is always inside the frame
    let (lo, hi) = scores
        .scores()
        .iter()
        .fold((threshold, threshold), |(lo, hi), &s| (lo.min(s), hi.max(s)));
    let pad = ((hi - lo) * 0.1).max(0.1);
    let x_max = scores.len().max(2) - 1;

    let root = BitMapBackend::new(output_path, (1400, 400)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("{protein_label}: B-cell Epitope Prediction (Hydrophilicity)"),
            caption_font,
        )
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(0..x_max, (lo - pad)..(hi + pad))
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("Amino Acid Position")
        .y_desc("Hydrophilicity")
        .axis_desc_style(axis_font)
        .label_style(label_font)
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(LineSeries::new(scores.iter(), BLUE.stroke_width(2)))
        .map_err(plot_err)?
        .label(format!("Hydrophilicity Score (window {})", scores.window()))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 25, y)], BLUE.stroke_width(2)));

    chart
        .draw_series(DashedLineSeries::new(
            vec![(0, threshold), (x_max, threshold)],
            10,
            6,
            RED.stroke_width(2),
        ))
        .map_err(plot_err)?
        .label(format!("Threshold = {threshold}"))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 25, y)], RED.stroke_width(2)));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font(label_font)
        .position(SeriesLabelPosition::UpperRight)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    info!("Hydrophilicity plot saved to {}", output_path.display());
    Ok(true)
}

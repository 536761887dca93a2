use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::prediction_tools::scales::{self, HydrophilicityScale};

/// Everything a run needs. Defaults are the HIV-1 env B-cell/T-cell settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub fasta_path: PathBuf,
    pub output_dir: PathBuf,
    /// Used in plot captions and log lines.
    pub protein_label: String,
    pub window_size: usize,
    pub threshold: f64,
    /// One of `parker`, `hopp-woods`, `kyte-doolittle` or `custom`.
    pub scale: String,
    pub custom_scale: Option<BTreeMap<String, f64>>,
    pub min_region_windows: usize,
    pub tcell_output: String,
    pub strains_fasta: Option<PathBuf>,
    pub min_identity: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            fasta_path: PathBuf::from("./data/hiv_env.fasta"),
            output_dir: PathBuf::from("./epitope_results"),
            protein_label: "HIV-1 env".to_string(),
            window_size: 7,
            threshold: 0.5,
            scale: scales::PARKER_NAME.to_string(),
            custom_scale: None,
            min_region_windows: 1,
            tcell_output: "hiv_tcell_epitopes.csv".to_string(),
            strains_fasta: None,
            min_identity: 0.8,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        info!("Reading configuration from {}", path.display());
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: PipelineConfig = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.window_size == 0 {
            bail!("window_size must be at least 1");
        }
        if !self.threshold.is_finite() {
            bail!("threshold must be a finite number, got {}", self.threshold);
        }
        if !(0.0..=1.0).contains(&self.min_identity) {
            bail!("min_identity must lie in [0, 1], got {}", self.min_identity);
        }
        if self.tcell_output.trim().is_empty() {
            bail!("tcell_output file name is empty");
        }
        // Resolving the scale surfaces unknown names and bad custom tables.
        self.hydrophilicity_scale()?;
        Ok(())
    }

    pub fn hydrophilicity_scale(&self) -> anyhow::Result<HydrophilicityScale> {
        if self.scale.eq_ignore_ascii_case(scales::CUSTOM_NAME) {
            let Some(table) = &self.custom_scale else {
                bail!("scale is `custom` but no custom_scale table was given");
            };
            return HydrophilicityScale::from_table(scales::CUSTOM_NAME, table);
        }
        scales::scale_by_name(&self.scale)
    }
}

#[derive(Parser, Debug, Default)]
#[command(name = "epitope_mapper", about = "B-cell and T-cell epitope mapping for a single protein")]
pub struct CliArgs {
    /// Single-record protein FASTA to analyse
    #[arg(long, env = "EPITOPE_FASTA")]
    pub fasta: Option<PathBuf>,

    /// JSON configuration file; flags given here take precedence
    #[arg(long, env = "EPITOPE_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "EPITOPE_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Sliding window width in residues
    #[arg(long, env = "EPITOPE_WINDOW")]
    pub window: Option<usize>,

    /// Scores strictly above this are B-cell candidates
    #[arg(long, env = "EPITOPE_THRESHOLD")]
    pub threshold: Option<f64>,

    #[arg(long, env = "EPITOPE_SCALE")]
    pub scale: Option<String>,

    /// Multi-FASTA of pre-aligned strains for the conservancy check
    #[arg(long, env = "EPITOPE_STRAINS")]
    pub strains: Option<PathBuf>,
}

impl CliArgs {
    /// Build the effective config: file (if any), then flag overrides, then validation.
    pub fn resolve(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(fasta) = &self.fasta {
            config.fasta_path = fasta.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(window) = self.window {
            config.window_size = window;
        }
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(scale) = &self.scale {
            config.scale = scale.clone();
        }
        if let Some(strains) = &self.strains {
            config.strains_fasta = Some(strains.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

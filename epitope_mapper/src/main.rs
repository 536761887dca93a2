use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::analysis::conservancy::{epitope_conservancy, write_conservancy_csv};
use crate::analysis::epitope_export::{export_bcell_regions, export_profile, export_tcell_epitopes};
use crate::analysis::profile_plot::plot_hydrophilicity_profile;
use crate::config::{CliArgs, PipelineConfig};
use crate::data_handling::fasta::{read_multi_fasta, read_single_fasta};
use crate::helper_functions::{resolve_path, write_config_json};
use crate::models::{BCellRegion, EpitopeConservancy, TCellEpitope, TCellEpitopePredictor};
use crate::prediction_tools::bcell_regions::call_bcell_regions;
use crate::prediction_tools::hydrophilicity::{HydrophilicityProfiler, WindowScores};
use crate::prediction_tools::mhc_mock::MockMhcPredictor;

mod analysis;
mod config;
mod data_handling;
mod helper_functions;
mod models;
mod prediction_tools;

/// What a run produced, kept around for the closing summary.
#[derive(Debug)]
struct RunReport {
    scores: WindowScores,
    regions: Vec<BCellRegion>,
    tcell_epitopes: Vec<TCellEpitope>,
    conservancy: Vec<EpitopeConservancy>,
    tcell_csv: PathBuf,
    plot: Option<PathBuf>,
}

fn main() -> ExitCode {
    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    let result = args
        .resolve()
        .and_then(|config| run(&config, &MockMhcPredictor));

    match result {
        Ok(report) => {
            info!(
                "Done: {} windows, {} B-cell regions, {} T-cell epitopes -> {}",
                report.scores.len(),
                report.regions.len(),
                report.tcell_epitopes.len(),
                report.tcell_csv.display()
            );
            if let Some(plot) = &report.plot {
                info!("Profile plot: {}", plot.display());
            }
            if !report.conservancy.is_empty() {
                let kept = report.conservancy.iter().filter(|c| c.retained).count();
                info!("{} of {} epitopes pass the conservancy filter", kept, report.conservancy.len());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Epitope mapping failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &PipelineConfig, predictor: &dyn TCellEpitopePredictor) -> anyhow::Result<RunReport> {
    info!("Starting epitope mapping for {}", config.protein_label);
    config.validate()?;

    let output_dir = resolve_path(&config.output_dir);
    write_config_json(config, &output_dir)
        .with_context(|| format!("could not write run config to {}", output_dir.display()))?;

    // Load the query protein
    let sequence = read_single_fasta(&resolve_path(&config.fasta_path))?;
    info!("Loaded {} protein of length {}", config.protein_label, sequence.len());

    // B-cell: sliding-window hydrophilicity
    let profiler = HydrophilicityProfiler::new(config.hydrophilicity_scale()?, config.window_size)?;
    let scores = profiler.profile(&sequence);
    info!("{} windows of {} residues scored", scores.len(), profiler.window());
    let regions = call_bcell_regions(&sequence, &scores, config.threshold, config.min_region_windows);

    let plot_path = output_dir.join("bcell_hydrophilicity.png");
    // A missing font or backend should not cost the tables
    let plot = match plot_hydrophilicity_profile(&scores, config.threshold, &config.protein_label, &plot_path) {
        Ok(written) => written.then_some(plot_path),
        Err(e) => {
            warn!("Could not render hydrophilicity plot: {:#}", e);
            None
        }
    };
    export_profile(&scores, config.threshold, &output_dir.join("bcell_profile.csv"))?;
    export_bcell_regions(&regions, &output_dir.join("bcell_regions.csv"))?;

    // T-cell: MHC-I predictions
    info!("Predicting T-cell epitopes with {}", predictor.name());
    let tcell_epitopes = predictor.predict(&sequence)?;
    let tcell_csv = output_dir.join(&config.tcell_output);
    export_tcell_epitopes(&tcell_epitopes, &tcell_csv)?;

    // Optional conservancy across aligned strains
    let conservancy = match &config.strains_fasta {
        Some(path) => {
            let strains = read_multi_fasta(&resolve_path(path))?;
            let results = epitope_conservancy(&tcell_epitopes, &strains, config.min_identity);
            if !results.is_empty() {
                write_conservancy_csv(&results, &output_dir.join("epitope_conservancy.csv"))?;
            }
            results
        }
        None => Vec::new(),
    };

    Ok(RunReport {
        scores,
        regions,
        tcell_epitopes,
        conservancy,
        tcell_csv,
        plot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use crate::analysis::epitope_export::read_tcell_epitopes;

    const ENV_FRAGMENT: &str = "MRVKEKYQHLWRWGWRWGTMLLGMLMICSATEKLWVTVYYGVPVWKEATTTLFCASDAKAYDTEVHNVWATHACVPTDPNPQEVVLVNVTENFNMWKNDMVEQMHEDIISLWDQSLKPCVKLTPLCVSLKCTDLKNDTNTNSSSGRMIMEKGEIKNCSFNISTSIRGKVQKEYAFFYKLDIIPIDNDTTSYKLTSCNTSVITQACPKVSFEPIPIHYCAPAGFAILKCNNKTFNGTGPCTNVSTVQCTHGIRPVVSTQLLLNGSLAEEEVVIRSVNFTDNAKTIIVQLNTSVEINCTRPNNNTRKRIRIQRGPGRAFVTIGKIGNMRQAHCNISRAKWNNTLKQIASKLREQFGNNKTIIFKQSSGGDPEIVTHSFNCGGEFFYCNSTQLFNSTWFNSTWSTEGSNNTEGSDTITLPCRIKQIINMWQKVGKAMYAPPISGQIRCSSNITGLLLTRDGGNSNNESEIFRPGGGDMRDNWRSELYKYKVVKIEPLGVAPTKAKRRVVQREKR";

    fn fixture(dir: &std::path::Path, strains: bool) -> PipelineConfig {
        let fasta = dir.join("hiv_env.fasta");
        fs::write(&fasta, format!(">env HIV-1 envelope\n{}\n", ENV_FRAGMENT)).unwrap();

        let strains_fasta = strains.then(|| {
            let path = dir.join("strains.fasta");
            fs::write(&path, format!(">clade_b\n{}\n>clade_c\n{}\n", ENV_FRAGMENT, ENV_FRAGMENT.to_lowercase()))
                .unwrap();
            path
        });

        PipelineConfig {
            fasta_path: fasta,
            output_dir: dir.join("out"),
            strains_fasta,
            ..Default::default()
        }
    }

    #[test]
    fn pipeline_writes_every_table() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixture(dir.path(), true);
        let out = dir.path().join("out");

        let report = run(&config, &MockMhcPredictor).unwrap();

        assert_eq!(report.scores.len(), ENV_FRAGMENT.len() - 6);
        assert!(!report.regions.is_empty());
        assert_eq!(report.tcell_epitopes.len(), 4);
        assert_eq!(report.conservancy.len(), 4);
        if let Some(plot) = &report.plot {
            assert!(plot.exists());
        }

        for file in [
            "run_config.json",
            "bcell_profile.csv",
            "bcell_regions.csv",
            "hiv_tcell_epitopes.csv",
            "epitope_conservancy.csv",
        ] {
            assert!(out.join(file).exists(), "{file} missing");
        }
        assert_eq!(read_tcell_epitopes(&report.tcell_csv).unwrap(), report.tcell_epitopes);
    }

    #[test]
    fn no_strains_no_conservancy_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixture(dir.path(), false);

        let report = run(&config, &MockMhcPredictor).unwrap();
        assert!(report.conservancy.is_empty());
        assert!(!dir.path().join("out/epitope_conservancy.csv").exists());
    }

    #[test]
    fn short_protein_still_exports_tcell_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = fixture(dir.path(), false);
        fs::write(&config.fasta_path, ">tiny\nKQIIN\n").unwrap();
        config.window_size = 7;

        let report = run(&config, &MockMhcPredictor).unwrap();
        assert!(report.scores.is_empty());
        assert!(report.regions.is_empty());
        assert!(report.plot.is_none());
        assert!(report.tcell_csv.exists());
    }

    #[test]
    fn header_only_fasta_gives_empty_profile() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixture(dir.path(), false);
        fs::write(&config.fasta_path, ">empty\n").unwrap();

        let report = run(&config, &MockMhcPredictor).unwrap();

        assert!(report.scores.is_empty());
        assert!(report.regions.is_empty());
        assert!(report.plot.is_none());
        assert_eq!(read_tcell_epitopes(&report.tcell_csv).unwrap().len(), 4);
    }

    #[test]
    fn missing_fasta_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = fixture(dir.path(), false);
        config.fasta_path = dir.path().join("absent.fasta");

        assert!(run(&config, &MockMhcPredictor).is_err());
    }
}

//! Epitope conservancy across pre-aligned strain sequences.
//!
//! Each epitope is compared position by position against every strain at
//! its recorded start offset. Gaps and positions past the end of a strain
//! count as mismatches. Nothing is re-aligned here.

use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

use crate::models::{EpitopeConservancy, ProteinSequence, TCellEpitope};

const GAP_SYMBOLS: [u8; 2] = [b'-', b'.'];

/// Fraction of epitope residues matched by the strain at `start`.
pub fn epitope_identity(epitope: &str, strain: &ProteinSequence, start: usize) -> f64 {
    let epitope = epitope.as_bytes();
    if epitope.is_empty() {
        return 0.0;
    }

    let matches = epitope
        .iter()
        .enumerate()
        .filter(|&(offset, aa)| match strain.residues().get(start + offset) {
            Some(s) if GAP_SYMBOLS.contains(s) => false,
            Some(s) => s.eq_ignore_ascii_case(aa),
            None => false,
        })
        .count();

    matches as f64 / epitope.len() as f64
}

pub fn epitope_conservancy(
    epitopes: &[TCellEpitope],
    strains: &[ProteinSequence],
    min_identity: f64,
) -> Vec<EpitopeConservancy> {
    if strains.is_empty() {
        warn!("No strain sequences supplied, skipping conservancy");
        return Vec::new();
    }

    let results: Vec<EpitopeConservancy> = epitopes
        .iter()
        .map(|epitope| {
            // A negative offset cannot line up with any strain.
            let identities: Vec<f64> = match usize::try_from(epitope.start) {
                Ok(start) => strains
                    .iter()
                    .map(|strain| epitope_identity(&epitope.epitope, strain, start))
                    .collect(),
                Err(_) => vec![0.0; strains.len()],
            };

            let n = identities.len() as f64;
            let mean_identity = identities.iter().sum::<f64>() / n;
            let min = identities.iter().copied().fold(f64::INFINITY, f64::min);
            let max = identities.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let conserved = identities.iter().filter(|&&id| id >= min_identity).count();

            EpitopeConservancy {
                epitope: epitope.epitope.clone(),
                start: epitope.start,
                strains_compared: identities.len(),
                min_identity: min,
                mean_identity,
                max_identity: max,
                conserved_fraction: conserved as f64 / n,
                retained: mean_identity >= min_identity,
            }
        })
        .collect();

    let retained = results.iter().filter(|r| r.retained).count();
    info!(
        "{} of {} epitopes conserved at >= {:.0}% identity across {} strains",
        retained,
        results.len(),
        min_identity * 100.0,
        strains.len()
    );
    results
}

pub fn write_conservancy_csv(results: &[EpitopeConservancy], path: &Path) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for result in results {
        wtr.serialize(result)?;
    }
    wtr.flush()?;
    info!("Conservancy table written to {}", path.display());
    Ok(())
}

use std::error::Error;
use polars::prelude::PolarsError;
use serde::{Deserialize, Serialize};

/// Wrap any std error so it can travel through `PolarsResult` code paths.
pub fn polars_err(e: Box<dyn Error + Send + Sync>) -> PolarsError {
    PolarsError::ComputeError(format!("{}", e).into())
}

/// A single protein record. Residues are stored uppercased and never change after load.
#[derive(Debug, Clone, PartialEq)]
pub struct ProteinSequence {
    id: String,
    description: String,
    residues: Vec<u8>,
}

impl ProteinSequence {
    pub fn new(id: impl Into<String>, description: impl Into<String>, residues: &[u8]) -> Self {
        ProteinSequence {
            id: id.into(),
            description: description.into(),
            residues: residues.iter().map(|b| b.to_ascii_uppercase()).collect(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn residues(&self) -> &[u8] {
        &self.residues
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// Residues as text, for logging and peptide extraction.
    pub fn to_sequence_string(&self) -> String {
        String::from_utf8_lossy(&self.residues).into_owned()
    }
}

/// One predicted MHC-I binder, laid out exactly like the exported CSV row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TCellEpitope {
    #[serde(rename = "Epitope")]
    pub epitope: String,
    #[serde(rename = "Start")]
    pub start: i64,
    #[serde(rename = "Allele")]
    pub allele: String,
    #[serde(rename = "Score")]
    pub score: f64,
}

/// Maximal run of window positions scoring above the B-cell threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BCellRegion {
    pub region_start: usize,
    /// Inclusive.
    pub region_end: usize,
    pub residue_start: usize,
    /// Inclusive.
    pub residue_end: usize,
    pub peptide: String,
    pub mean_score: f64,
    pub max_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpitopeConservancy {
    pub epitope: String,
    pub start: i64,
    pub strains_compared: usize,
    pub min_identity: f64,
    pub mean_identity: f64,
    pub max_identity: f64,
    pub conserved_fraction: f64,
    pub retained: bool,
}

/// Anything that can hand over protein records.
pub trait SequenceSource {
    fn load(&self) -> anyhow::Result<Vec<ProteinSequence>>;
}

/// MHC-I binding predictor. The mock table and any real tool share this seam.
pub trait TCellEpitopePredictor {
    fn name(&self) -> &str;

    fn predict(&self, sequence: &ProteinSequence) -> anyhow::Result<Vec<TCellEpitope>>;
}

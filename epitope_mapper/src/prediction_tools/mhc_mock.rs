use tracing::{info, warn};

use crate::models::{ProteinSequence, TCellEpitope, TCellEpitopePredictor};

pub const MOCK_ALLELE: &str = "HLA-A*02:01";

/// (epitope, start, score) rows of the placeholder MHC-I table.
const MOCK_ROWS: [(&str, i64, f64); 4] = [
    ("KQIINMWQ", 5, 0.91),
    ("WASLWNWF", 45, 0.85),
    ("IYKRWIIL", 120, 0.88),
    ("FLKEKGGL", 260, 0.86),
];

/// Stand-in for a NetMHCpan style predictor. Returns the same four
/// HLA-A*02:01 binders whatever sequence it is given.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockMhcPredictor;

impl TCellEpitopePredictor for MockMhcPredictor {
    fn name(&self) -> &str {
        "mock MHC-I"
    }

    fn predict(&self, sequence: &ProteinSequence) -> anyhow::Result<Vec<TCellEpitope>> {
        warn!(
            "Using placeholder T-cell predictions; {} is not actually scored",
            sequence.id()
        );

        let epitopes: Vec<TCellEpitope> = MOCK_ROWS
            .iter()
            .map(|&(epitope, start, score)| TCellEpitope {
                epitope: epitope.to_string(),
                start,
                allele: MOCK_ALLELE.to_string(),
                score,
            })
            .collect();

        info!("{} returned {} epitopes", self.name(), epitopes.len());
        Ok(epitopes)
    }
}

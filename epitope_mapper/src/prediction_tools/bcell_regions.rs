use tracing::{debug, info};

use crate::models::{BCellRegion, ProteinSequence};
use crate::prediction_tools::hydrophilicity::{is_candidate_bcell, WindowScores};

/// Collapse consecutive above-threshold windows into regions.
///
/// Runs shorter than `min_windows` are dropped. A region spanning window
/// indices `s..=e` covers residues `s..=e + window - 1`.
pub fn call_bcell_regions(
    sequence: &ProteinSequence,
    scores: &WindowScores,
    threshold: f64,
    min_windows: usize,
) -> Vec<BCellRegion> {
    let mut regions = Vec::new();
    let mut run_start: Option<usize> = None;

    for (i, score) in scores.iter() {
        match (is_candidate_bcell(score, threshold), run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                push_region(&mut regions, sequence, scores, start, i - 1, min_windows);
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        push_region(&mut regions, sequence, scores, start, scores.len() - 1, min_windows);
    }

    info!(
        "Found {} candidate B-cell regions above {:.2} in {}",
        regions.len(),
        threshold,
        sequence.id()
    );
    regions
}

fn push_region(
    regions: &mut Vec<BCellRegion>,
    sequence: &ProteinSequence,
    scores: &WindowScores,
    start: usize,
    end: usize,
    min_windows: usize,
) {
    let run = &scores.scores()[start..=end];
    if run.len() < min_windows {
        debug!("Dropping run {}..={} shorter than {} windows", start, end, min_windows);
        return;
    }

    let residue_end = end + scores.window() - 1;
    // Clamp in case the scores were computed from a different sequence.
    let residues = sequence.residues();
    let peptide_end = (residue_end + 1).min(residues.len());
    let peptide = residues
        .get(start..peptide_end)
        .map(|p| String::from_utf8_lossy(p).into_owned())
        .unwrap_or_default();

    let mean_score = run.iter().sum::<f64>() / run.len() as f64;
    let max_score = run.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    regions.push(BCellRegion {
        region_start: start,
        region_end: end,
        residue_start: start,
        residue_end,
        peptide,
        mean_score,
        max_score,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction_tools::hydrophilicity::HydrophilicityProfiler;
    use crate::prediction_tools::scales::HydrophilicityScale;

    fn profile(residues: &str, window: usize) -> (ProteinSequence, WindowScores) {
        let sequence = ProteinSequence::new("p", "", residues.as_bytes());
        let profiler = HydrophilicityProfiler::new(HydrophilicityScale::parker(), window).unwrap();
        let scores = profiler.profile(&sequence);
        (sequence, scores)
    }

    #[test]
    fn splits_runs_at_low_windows() {
        // window 1: K=3.0, A=0.0, S=0.3, D=3.0
        let (sequence, scores) = profile("KKASD", 1);
        let regions = call_bcell_regions(&sequence, &scores, 0.5, 1);

        assert_eq!(regions.len(), 2);
        assert_eq!((regions[0].region_start, regions[0].region_end), (0, 1));
        assert_eq!(regions[0].peptide, "KK");
        assert_eq!((regions[1].region_start, regions[1].region_end), (4, 4));
        assert_eq!(regions[1].peptide, "D");
    }

    #[test]
    fn residue_span_covers_whole_windows() {
        let (sequence, scores) = profile("AAAAAAAKKKKKKKKAAAAAAA", 7);
        let regions = call_bcell_regions(&sequence, &scores, 0.5, 1);

        assert_eq!(regions.len(), 1);
        let region = &regions[0];
        assert_eq!(region.residue_end, region.region_end + 6);
        assert_eq!(region.peptide.len(), region.residue_end - region.residue_start + 1);
        assert!(region.peptide.contains("KKKKKKKK"));
        assert!((region.max_score - 3.0).abs() < 1e-12);
        assert!(region.mean_score <= region.max_score);
    }

    #[test]
    fn score_equal_to_threshold_is_not_called() {
        // window 2 over "KA" gives exactly 1.5
        let (sequence, scores) = profile("KA", 2);
        assert!(call_bcell_regions(&sequence, &scores, 1.5, 1).is_empty());
        assert_eq!(call_bcell_regions(&sequence, &scores, 1.49, 1).len(), 1);
    }

    #[test]
    fn short_runs_filtered() {
        let (sequence, scores) = profile("KAKKKA", 1);
        let regions = call_bcell_regions(&sequence, &scores, 0.5, 2);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].peptide, "KKK");
    }

    #[test]
    fn empty_profile_gives_no_regions() {
        let (sequence, scores) = profile("KKK", 7);
        assert!(call_bcell_regions(&sequence, &scores, 0.5, 1).is_empty());
    }
}

use anyhow::bail;
use tracing::{debug, info, warn};

use crate::models::ProteinSequence;
use crate::prediction_tools::scales::HydrophilicityScale;

/// Standard Parker window width.
pub const DEFAULT_WINDOW_SIZE: usize = 7;

/// Per-window mean hydrophilicity, index i covering residues `i..i + window`.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowScores {
    window: usize,
    scores: Vec<f64>,
}

impl WindowScores {
    pub fn window(&self) -> usize {
        self.window
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.scores.iter().copied().enumerate()
    }
}

/// Sliding-window hydrophilicity scoring over a configurable scale.
#[derive(Debug, Clone)]
pub struct HydrophilicityProfiler {
    scale: HydrophilicityScale,
    window: usize,
}

impl HydrophilicityProfiler {
    pub fn new(scale: HydrophilicityScale, window: usize) -> anyhow::Result<Self> {
        if window == 0 {
            bail!("window size must be at least 1");
        }
        Ok(HydrophilicityProfiler { scale, window })
    }

    pub fn scale(&self) -> &HydrophilicityScale {
        &self.scale
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn profile(&self, sequence: &ProteinSequence) -> WindowScores {
        if self.scale.is_empty() {
            warn!("Scale '{}' has no entries, every window scores 0.0", self.scale.name());
        }
        info!(
            "Scoring {} ({} aa) with scale '{}' ({} residues), window {}",
            sequence.id(),
            sequence.len(),
            self.scale.name(),
            self.scale.len(),
            self.window
        );
        self.profile_residues(sequence.residues())
    }

    /// Output length is `max(0, n - window + 1)`; shorter input gives an empty profile.
    pub fn profile_residues(&self, residues: &[u8]) -> WindowScores {
        let scores: Vec<f64> = residues
            .windows(self.window)
            .map(|w| w.iter().map(|&aa| self.scale.value(aa)).sum::<f64>() / self.window as f64)
            .collect();

        if scores.is_empty() {
            debug!(
                "Sequence of {} residues is shorter than window {}, no scores produced",
                residues.len(),
                self.window
            );
        }

        WindowScores { window: self.window, scores }
    }
}

/// Scores strictly above the threshold mark a candidate B-cell epitope position.
pub fn is_candidate_bcell(score: f64, threshold: f64) -> bool {
    score > threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction_tools::scales::{scale_by_name, KYTE_DOOLITTLE_NAME};

    fn parker_profiler() -> HydrophilicityProfiler {
        HydrophilicityProfiler::new(HydrophilicityScale::parker(), DEFAULT_WINDOW_SIZE).unwrap()
    }

    fn seq(residues: &str) -> ProteinSequence {
        ProteinSequence::new("test", "", residues.as_bytes())
    }

    #[test]
    fn poly_alanine_scores_zero() {
        let scores = parker_profiler().profile(&seq("AAAAAAA"));
        assert_eq!(scores.scores(), &[0.0]);
    }

    #[test]
    fn poly_lysine_scores_three() {
        let scores = parker_profiler().profile(&seq("KKKKKKK"));
        assert_eq!(scores.scores(), &[3.0]);
    }

    #[test]
    fn ten_residues_give_four_windows() {
        let scores = parker_profiler().profile(&seq("ACDEFGHIKL"));
        assert_eq!(scores.len(), 4);
        assert_eq!(scores.window(), 7);
    }

    #[test]
    fn short_and_empty_sequences_give_empty_profile() {
        assert!(parker_profiler().profile(&seq("ACDEFG")).is_empty());
        assert!(parker_profiler().profile(&seq("")).is_empty());
    }

    #[test]
    fn output_length_is_n_minus_w_plus_one() {
        let residues = "MRVKEKYQHLWRWGWRWGTMLLGMLMICSA";
        for window in 1..=12 {
            let profiler = HydrophilicityProfiler::new(HydrophilicityScale::parker(), window).unwrap();
            for n in 0..=residues.len() {
                let expected = (n + 1).saturating_sub(window);
                assert_eq!(profiler.profile_residues(&residues.as_bytes()[..n]).len(), expected);
            }
        }
    }

    #[test]
    fn constant_sequence_gives_constant_profile() {
        let profiler = parker_profiler();
        for (aa, value) in [(b'D', 3.0), (b'W', -3.4), (b'S', 0.3)] {
            let residues = vec![aa; 25];
            let scores = profiler.profile_residues(&residues);
            assert_eq!(scores.len(), 19);
            assert!(scores.scores().iter().all(|&s| (s - value).abs() < 1e-12));
        }
    }

    #[test]
    fn scores_stay_within_scale_bounds() {
        let profiler = HydrophilicityProfiler::new(scale_by_name(KYTE_DOOLITTLE_NAME).unwrap(), 5).unwrap();
        let (lo, hi) = profiler.scale().bounds();
        let scores = profiler.profile(&seq("MRVKEKYQHLWRWGWRWGTMLLGMLMICSAXXBZ"));
        assert!(scores.scores().iter().all(|&s| s >= lo - 1e-12 && s <= hi + 1e-12));
    }

    #[test]
    fn unknown_residues_count_as_zero() {
        // one K replaced by X: sum drops by 3.0
        let scores = parker_profiler().profile(&seq("KKKXKKK"));
        assert!((scores.scores()[0] - 18.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn lowercase_input_matches_uppercase() {
        let profiler = parker_profiler();
        let upper = profiler.profile_residues(b"KQIINMWQDERS");
        let lower = profiler.profile_residues(b"kqiinmwqders");
        assert_eq!(upper, lower);
    }

    #[test]
    fn window_average_is_exact() {
        // D E K R A G S = 3 + 3 + 3 + 3 + 0 + 0 + 0.3
        let scores = parker_profiler().profile(&seq("DEKRAGS"));
        assert!((scores.scores()[0] - 12.3 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn zero_window_rejected() {
        assert!(HydrophilicityProfiler::new(HydrophilicityScale::parker(), 0).is_err());
    }

    #[test]
    fn threshold_is_strict() {
        assert!(is_candidate_bcell(0.51, 0.5));
        assert!(!is_candidate_bcell(0.5, 0.5));
        assert!(!is_candidate_bcell(-1.0, 0.5));
    }
}

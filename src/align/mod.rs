//! Dynamic time warping over MFCC frame sequences.

use ndarray::Array2;
use tracing::debug;

use crate::config::AlignmentConfig;
use crate::error::{EngineError, Result};
use crate::types::AlignmentResult;

/// Computes the optimal monotonic alignment between two cepstral sequences
/// and its distortion cost.
#[derive(Debug, Clone, Default)]
pub struct DtwAligner {
    config: AlignmentConfig,
}

impl DtwAligner {
    pub fn new(config: AlignmentConfig) -> Self {
        Self { config }
    }

    /// Align `user` frames onto `reference` frames.
    ///
    /// The search is restricted to a Sakoe-Chiba band around the main
    /// diagonal; the band is widened to the length difference of the two
    /// sequences so every input remains feasible. Backtracking breaks cost
    /// ties diagonal > vertical > horizontal for determinism.
    pub fn align(&self, user: &Array2<f32>, reference: &Array2<f32>) -> Result<AlignmentResult> {
        let n = user.nrows();
        let m = reference.nrows();
        if n == 0 || m == 0 {
            return Err(EngineError::DegenerateSequence(
                "cannot align an empty cepstral sequence",
            ));
        }
        if user.ncols() != reference.ncols() {
            return Err(EngineError::DegenerateSequence(
                "cepstral sequences have mismatched coefficient widths",
            ));
        }

        let band = self.config.band_radius.max(n.abs_diff(m));
        let mut cumulative = Array2::from_elem((n, m), f32::INFINITY);

        for i in 0..n {
            for j in band_range(i, m, band) {
                let local = frame_distance(user, reference, i, j);
                let best_predecessor = match (i, j) {
                    (0, 0) => 0.0,
                    (0, _) => cumulative[(0, j - 1)],
                    (_, 0) => cumulative[(i - 1, 0)],
                    _ => cumulative[(i - 1, j - 1)]
                        .min(cumulative[(i - 1, j)])
                        .min(cumulative[(i, j - 1)]),
                };
                cumulative[(i, j)] = local + best_predecessor;
            }
        }

        let total_cost = cumulative[(n - 1, m - 1)];
        if !total_cost.is_finite() {
            return Err(EngineError::DegenerateSequence(
                "alignment cost did not converge to a finite value",
            ));
        }

        let path = backtrack(&cumulative, n, m);
        let normalized_cost = total_cost / path.len() as f32;
        debug!(
            user_frames = n,
            reference_frames = m,
            band,
            total_cost = total_cost as f64,
            normalized_cost = normalized_cost as f64,
            "computed DTW alignment"
        );
        Ok(AlignmentResult {
            total_cost,
            path,
            normalized_cost,
        })
    }
}

/// Column span of the Sakoe-Chiba band on row `i`.
fn band_range(i: usize, m: usize, band: usize) -> std::ops::Range<usize> {
    let lower = i.saturating_sub(band);
    let upper = (i + band + 1).min(m);
    lower..upper
}

fn frame_distance(a: &Array2<f32>, b: &Array2<f32>, i: usize, j: usize) -> f32 {
    let sum: f32 = a
        .row(i)
        .iter()
        .zip(b.row(j).iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum();
    sum.sqrt()
}

fn backtrack(cumulative: &Array2<f32>, n: usize, m: usize) -> Vec<(usize, usize)> {
    let mut path = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (n - 1, m - 1);
    path.push((i, j));
    while i > 0 || j > 0 {
        let (next_i, next_j) = match (i, j) {
            (0, _) => (0, j - 1),
            (_, 0) => (i - 1, 0),
            _ => {
                // Preference order on ties: diagonal, vertical, horizontal.
                let candidates = [
                    (i - 1, j - 1, cumulative[(i - 1, j - 1)]),
                    (i - 1, j, cumulative[(i - 1, j)]),
                    (i, j - 1, cumulative[(i, j - 1)]),
                ];
                let mut best = candidates[0];
                for candidate in &candidates[1..] {
                    if candidate.2 < best.2 {
                        best = *candidate;
                    }
                }
                (best.0, best.1)
            }
        };
        i = next_i;
        j = next_j;
        path.push((i, j));
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sequence(rows: &[[f32; 2]]) -> Array2<f32> {
        let mut matrix = Array2::zeros((rows.len(), 2));
        for (index, row) in rows.iter().enumerate() {
            matrix[(index, 0)] = row[0];
            matrix[(index, 1)] = row[1];
        }
        matrix
    }

    #[test]
    fn self_alignment_is_free_and_diagonal() {
        let seq = sequence(&[[0.0, 1.0], [1.0, 0.5], [2.0, -1.0], [0.5, 0.5]]);
        let aligner = DtwAligner::default();
        let result = aligner.align(&seq, &seq).unwrap();
        assert_eq!(result.total_cost, 0.0);
        assert_eq!(result.normalized_cost, 0.0);
        let diagonal: Vec<(usize, usize)> = (0..4).map(|i| (i, i)).collect();
        assert_eq!(result.path, diagonal);
    }

    #[test]
    fn path_endpoints_are_pinned_and_monotonic() {
        let user = sequence(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]]);
        let reference = sequence(&[[0.0, 0.0], [2.0, 2.0], [4.0, 4.0]]);
        let result = DtwAligner::default().align(&user, &reference).unwrap();
        assert_eq!(*result.path.first().unwrap(), (0, 0));
        assert_eq!(*result.path.last().unwrap(), (4, 2));
        for window in result.path.windows(2) {
            let (i0, j0) = window[0];
            let (i1, j1) = window[1];
            assert!(i1 >= i0 && j1 >= j0);
            assert!(i1 - i0 <= 1 && j1 - j0 <= 1);
        }
    }

    #[test]
    fn length_one_sequence_degenerates_to_a_line() {
        let single = array![[1.0_f32, 1.0]];
        let many = sequence(&[[1.0, 1.0], [1.0, 1.0], [1.0, 1.0]]);
        let result = DtwAligner::default().align(&single, &many).unwrap();
        assert_eq!(result.path, vec![(0, 0), (0, 1), (0, 2)]);
        assert_eq!(result.total_cost, 0.0);
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let empty = Array2::<f32>::zeros((0, 2));
        let seq = sequence(&[[0.0, 0.0]]);
        assert!(matches!(
            DtwAligner::default().align(&empty, &seq),
            Err(EngineError::DegenerateSequence(_))
        ));
    }

    #[test]
    fn mismatched_widths_are_rejected() {
        let narrow = Array2::<f32>::zeros((3, 2));
        let wide = Array2::<f32>::zeros((3, 3));
        assert!(matches!(
            DtwAligner::default().align(&narrow, &wide),
            Err(EngineError::DegenerateSequence(_))
        ));
    }

    #[test]
    fn narrow_band_still_handles_unequal_lengths() {
        let user = sequence(&[[0.0, 0.0]; 40]);
        let reference = sequence(&[[0.0, 0.0]; 8]);
        let aligner = DtwAligner::new(AlignmentConfig { band_radius: 1 });
        let result = aligner.align(&user, &reference).unwrap();
        assert_eq!(*result.path.last().unwrap(), (39, 7));
        assert_eq!(result.total_cost, 0.0);
    }

    #[test]
    fn repeated_runs_are_deterministic() {
        let user = sequence(&[[0.0, 1.0], [0.5, 0.5], [1.0, 0.0], [0.0, 0.0]]);
        let reference = sequence(&[[0.1, 0.9], [0.9, 0.1], [0.0, 0.1]]);
        let aligner = DtwAligner::default();
        let first = aligner.align(&user, &reference).unwrap();
        let second = aligner.align(&user, &reference).unwrap();
        assert_eq!(first.path, second.path);
        assert_eq!(first.total_cost.to_bits(), second.total_cost.to_bits());
    }
}

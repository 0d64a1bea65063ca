//! Score aggregation: fold the DTW distortion and prosodic deltas into one
//! 0-100 pronunciation score plus per-aspect sub-scores.

use tracing::debug;

use crate::config::ScoringConfig;
use crate::types::{Aspect, AspectScore, FeatureBundle};

/// Combines alignment cost with pitch, timing, and volume comparisons.
///
/// Deterministic: identical inputs always produce identical output. Comments
/// on the aspect scores are left empty here and filled in by the feedback
/// generator, which owns all user-facing text.
#[derive(Debug, Clone, Default)]
pub struct ScoreAggregator {
    config: ScoringConfig,
}

impl ScoreAggregator {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn aggregate(
        &self,
        normalized_cost: f32,
        user: &FeatureBundle,
        reference: &FeatureBundle,
    ) -> (f64, Vec<AspectScore>) {
        let base = self.base_similarity(normalized_cost);
        let pitch = self.pitch_aspect(user, reference);
        let timing = self.timing_aspect(user, reference);
        let volume = self.volume_aspect(user, reference);

        let weights = &self.config.weights;
        let mut weighted = weights.base * base;
        let mut weight_total = weights.base;
        if let Some(ref aspect) = pitch {
            weighted += weights.pitch * aspect.score;
            weight_total += weights.pitch;
        }
        weighted += weights.timing * timing.score;
        weight_total += weights.timing;
        weighted += weights.volume * volume.score;
        weight_total += weights.volume;

        // When pitch is skipped for low confidence its weight is
        // redistributed over the remaining terms, never treated as zero.
        let score = (weighted / weight_total).clamp(0.0, 100.0);

        let mut aspects = Vec::with_capacity(3);
        if let Some(aspect) = pitch {
            aspects.push(aspect);
        }
        aspects.push(timing);
        aspects.push(volume);

        debug!(
            normalized_cost = normalized_cost as f64,
            base, score, "aggregated pronunciation score"
        );
        (score, aspects)
    }

    /// Map normalized DTW cost to [0, 100]: linear, monotone decreasing,
    /// saturating at `cost_scale`.
    fn base_similarity(&self, normalized_cost: f32) -> f64 {
        let normalized = (normalized_cost / self.config.cost_scale).clamp(0.0, 1.0) as f64;
        (1.0 - normalized) * 100.0
    }

    /// Pitch deviation in Hz; `None` when either side lacks a confident
    /// pitch estimate, so unvoiced input is never penalized. The spread
    /// difference counts at half the weight of the mean difference.
    fn pitch_aspect(&self, user: &FeatureBundle, reference: &FeatureBundle) -> Option<AspectScore> {
        if !user.pitch_confident || !reference.pitch_confident {
            return None;
        }
        let delta = user.pitch_mean - reference.pitch_mean;
        let deviation = delta.abs() + (user.pitch_std - reference.pitch_std).abs() / 2.0;
        let score = saturating_score(deviation, self.config.pitch_tolerance_hz);
        Some(AspectScore {
            aspect: Aspect::Pitch,
            score,
            delta,
            comment: String::new(),
        })
    }

    /// Duration ratio, symmetric in over- and under-speaking: a clip twice
    /// or half the reference length scores the same.
    fn timing_aspect(&self, user: &FeatureBundle, reference: &FeatureBundle) -> AspectScore {
        let ratio = user.duration_secs / reference.duration_secs;
        let excess = ratio.max(1.0 / ratio) - 1.0;
        let score = saturating_score(excess, self.config.timing_tolerance);
        AspectScore {
            aspect: Aspect::Timing,
            score,
            delta: user.duration_secs - reference.duration_secs,
            comment: String::new(),
        }
    }

    fn volume_aspect(&self, user: &FeatureBundle, reference: &FeatureBundle) -> AspectScore {
        let delta = user.rms_mean - reference.rms_mean;
        let score = saturating_score(delta.abs(), self.config.rms_tolerance);
        AspectScore {
            aspect: Aspect::Volume,
            score,
            delta,
            comment: String::new(),
        }
    }
}

fn saturating_score(deviation: f64, tolerance: f64) -> f64 {
    (1.0 - (deviation / tolerance).min(1.0)) * 100.0
}

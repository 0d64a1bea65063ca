//! Core types for the accentor pronunciation-scoring pipeline

use clap::ValueEnum;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Raw audio data representation (mono, f32 samples in [-1.0, 1.0]).
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    /// Sample rate in Hz (e.g., 22050)
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Immutable acoustic snapshot of one clip, the unit both scoring and
/// alignment operate on.
#[derive(Debug, Clone)]
pub struct FeatureBundle {
    /// Clip length in seconds, always positive.
    pub duration_secs: f64,
    /// Mean fundamental frequency over voiced frames, Hz. Zero when no frame
    /// was voiced.
    pub pitch_mean: f64,
    /// Standard deviation of the fundamental frequency over voiced frames.
    pub pitch_std: f64,
    /// False when the pitch tracker found no voiced frame; downstream
    /// scoring must not penalize pitch in that case.
    pub pitch_confident: bool,
    /// Mean RMS energy of the resampled clip.
    pub rms_mean: f64,
    /// Frame-major MFCC matrix (frames x coefficients), mean/variance
    /// normalized per clip. At least one row; all rows share one width.
    pub mfcc: Array2<f32>,
}

impl FeatureBundle {
    pub fn frame_count(&self) -> usize {
        self.mfcc.nrows()
    }
}

/// Output of warping one MFCC sequence onto another.
#[derive(Debug, Clone)]
pub struct AlignmentResult {
    /// Accumulated local distance along the optimal path.
    pub total_cost: f32,
    /// Monotonic (i, j) frame pairs from (0, 0) to the last frames of both
    /// sequences.
    pub path: Vec<(usize, usize)>,
    /// `total_cost` divided by the path length, removing length bias.
    pub normalized_cost: f32,
}

/// Prosodic dimension evaluated alongside spectral similarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aspect {
    Pitch,
    Timing,
    Volume,
}

impl std::fmt::Display for Aspect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Aspect::Pitch => write!(f, "pitch"),
            Aspect::Timing => write!(f, "timing"),
            Aspect::Volume => write!(f, "volume"),
        }
    }
}

/// Sub-score for one prosodic aspect.
#[derive(Debug, Clone, Serialize)]
pub struct AspectScore {
    pub aspect: Aspect,
    /// 0-100, higher is closer to the reference.
    pub score: f64,
    /// Signed raw deviation (user minus reference, in the aspect's native
    /// unit); feedback uses the sign to pick a directional comment.
    pub delta: f64,
    /// Human-readable assessment filled in by the feedback generator.
    pub comment: String,
}

/// Caller-declared proficiency tier. Modulates rating strictness only; the
/// numeric scoring itself is level-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProficiencyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl ProficiencyLevel {
    pub const ALL: [ProficiencyLevel; 3] = [
        ProficiencyLevel::Beginner,
        ProficiencyLevel::Intermediate,
        ProficiencyLevel::Advanced,
    ];
}

impl std::fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProficiencyLevel::Beginner => write!(f, "beginner"),
            ProficiencyLevel::Intermediate => write!(f, "intermediate"),
            ProficiencyLevel::Advanced => write!(f, "advanced"),
        }
    }
}

/// Qualitative rating derived from the numeric score. Ordered so that
/// strictness invariants can be checked directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rating {
    NeedsImprovement,
    Fair,
    Good,
    Excellent,
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rating::NeedsImprovement => write!(f, "Needs Improvement"),
            Rating::Fair => write!(f, "Fair"),
            Rating::Good => write!(f, "Good"),
            Rating::Excellent => write!(f, "Excellent"),
        }
    }
}

/// Complete evaluation report handed back to the orchestration layer.
///
/// Built fresh per request and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    /// Overall pronunciation score in [0, 100].
    pub pronunciation_score: f64,
    pub rating: Rating,
    /// Headline message matching the rating.
    pub overall: String,
    /// One entry per evaluated aspect; an aspect skipped for low confidence
    /// is absent rather than neutral-filled.
    pub aspect_scores: Vec<AspectScore>,
    /// Single actionable suggestion keyed by the weakest aspect.
    pub tips: String,
    pub level: ProficiencyLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratings_are_ordered() {
        assert!(Rating::NeedsImprovement < Rating::Fair);
        assert!(Rating::Fair < Rating::Good);
        assert!(Rating::Good < Rating::Excellent);
    }

    #[test]
    fn clip_duration_uses_sample_rate() {
        let clip = AudioClip {
            samples: vec![0.0; 32_000],
            sample_rate: 16_000,
        };
        assert!((clip.duration_secs() - 2.0).abs() < 1e-9);
    }
}

//! Engine configuration: analysis parameters, scoring weights, and the
//! per-level feedback tables.
//!
//! Everything here is tunable rather than contractual. Defaults reproduce the
//! behavior the engine was calibrated against; deployments may override them
//! with a JSON file loaded through [`EngineConfig::from_file`].

use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::ProficiencyLevel;

/// Short-time analysis parameters shared by every extraction call.
///
/// The MFCC coefficient count in particular must be identical for all clips
/// that will ever be aligned against each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Canonical analysis rate; inputs are resampled to this before any
    /// spectral work.
    pub sample_rate: u32,
    pub window_ms: usize,
    pub hop_ms: usize,
    pub mel_bands: usize,
    pub mfcc_count: usize,
    /// Pitch search range for the pYIN tracker.
    pub pitch_floor_hz: f64,
    pub pitch_ceiling_hz: f64,
    /// Peak amplitude below which a clip is treated as silent.
    pub silence_floor: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            window_ms: 25,
            hop_ms: 10,
            mel_bands: 40,
            mfcc_count: 13,
            pitch_floor_hz: 55.0,
            pitch_ceiling_hz: 1200.0,
            silence_floor: 1e-4,
        }
    }
}

impl AnalysisConfig {
    pub fn window_samples(&self) -> usize {
        ((self.sample_rate as usize * self.window_ms) / 1000).max(1)
    }

    pub fn hop_samples(&self) -> usize {
        ((self.sample_rate as usize * self.hop_ms) / 1000).max(1)
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.sample_rate > 0, "sample_rate must be positive");
        ensure!(self.window_ms > 0, "window_ms must be positive");
        ensure!(self.hop_ms > 0, "hop_ms must be positive");
        ensure!(self.mel_bands > 1, "mel_bands must exceed 1");
        ensure!(self.mfcc_count > 0, "mfcc_count must be positive");
        ensure!(
            self.pitch_floor_hz > 0.0 && self.pitch_ceiling_hz > self.pitch_floor_hz,
            "pitch range must satisfy 0 < floor < ceiling"
        );
        Ok(())
    }
}

/// Dynamic-time-warping search constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Sakoe-Chiba band radius in frames. The aligner widens it to the
    /// sequence-length difference when needed, so any band keeps unequal
    /// lengths feasible.
    pub band_radius: usize,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self { band_radius: 64 }
    }
}

/// Relative contribution of spectral similarity and each prosodic aspect to
/// the final score. Must sum to 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub base: f64,
    pub pitch: f64,
    pub timing: f64,
    pub volume: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            base: 0.60,
            pitch: 0.15,
            timing: 0.15,
            volume: 0.10,
        }
    }
}

impl ScoreWeights {
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("base", self.base),
            ("pitch", self.pitch),
            ("timing", self.timing),
            ("volume", self.volume),
        ] {
            ensure!(value >= 0.0, "weight {name} must be non-negative");
        }
        let total = self.base + self.pitch + self.timing + self.volume;
        ensure!(
            (total - 1.0).abs() < 1e-6,
            "score weights must sum to 1, got {total}"
        );
        Ok(())
    }
}

/// Aggregation tunables: how alignment cost maps to similarity and how far
/// each prosodic deviation may stray before its sub-score bottoms out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoreWeights,
    /// Normalized DTW cost at which base similarity saturates to zero.
    /// Calibrated for Euclidean distance between variance-normalized MFCC
    /// rows.
    pub cost_scale: f32,
    /// Pitch-mean deviation (Hz) at which the pitch sub-score reaches zero.
    pub pitch_tolerance_hz: f64,
    /// Excess of the symmetric duration ratio (max(r, 1/r) - 1) at which the
    /// timing sub-score reaches zero.
    pub timing_tolerance: f64,
    /// RMS-mean deviation at which the volume sub-score reaches zero.
    pub rms_tolerance: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            cost_scale: 6.0,
            pitch_tolerance_hz: 50.0,
            timing_tolerance: 2.0,
            rms_tolerance: 0.05,
        }
    }
}

impl ScoringConfig {
    fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        ensure!(self.cost_scale > 0.0, "cost_scale must be positive");
        ensure!(
            self.pitch_tolerance_hz > 0.0,
            "pitch_tolerance_hz must be positive"
        );
        ensure!(
            self.timing_tolerance > 0.0,
            "timing_tolerance must be positive"
        );
        ensure!(self.rms_tolerance > 0.0, "rms_tolerance must be positive");
        Ok(())
    }
}

/// Rating boundaries and aspect floor for one proficiency level.
///
/// A score maps to `Excellent` at or above `excellent`, `Good` at or above
/// `good`, `Fair` at or above `fair`, and `NeedsImprovement` below that, so
/// the bands are contiguous and exhaustive over [0, 100] by construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LevelThresholds {
    pub excellent: f64,
    pub good: f64,
    pub fair: f64,
    /// Aspect sub-scores below this floor earn an improvement comment
    /// instead of an affirmation.
    pub aspect_floor: f64,
}

/// One threshold table per declared proficiency level; stricter levels carry
/// higher boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackTables {
    pub beginner: LevelThresholds,
    pub intermediate: LevelThresholds,
    pub advanced: LevelThresholds,
}

impl Default for FeedbackTables {
    fn default() -> Self {
        Self {
            beginner: LevelThresholds {
                excellent: 75.0,
                good: 60.0,
                fair: 45.0,
                aspect_floor: 60.0,
            },
            intermediate: LevelThresholds {
                excellent: 85.0,
                good: 70.0,
                fair: 55.0,
                aspect_floor: 70.0,
            },
            advanced: LevelThresholds {
                excellent: 90.0,
                good: 80.0,
                fair: 65.0,
                aspect_floor: 80.0,
            },
        }
    }
}

impl FeedbackTables {
    pub fn level(&self, level: ProficiencyLevel) -> &LevelThresholds {
        match level {
            ProficiencyLevel::Beginner => &self.beginner,
            ProficiencyLevel::Intermediate => &self.intermediate,
            ProficiencyLevel::Advanced => &self.advanced,
        }
    }

    fn validate(&self) -> Result<()> {
        for (name, table) in [
            ("beginner", &self.beginner),
            ("intermediate", &self.intermediate),
            ("advanced", &self.advanced),
        ] {
            ensure!(
                table.excellent > table.good && table.good > table.fair && table.fair > 0.0,
                "{name} thresholds must satisfy excellent > good > fair > 0"
            );
            ensure!(
                table.excellent <= 100.0,
                "{name} excellent threshold exceeds 100"
            );
            ensure!(
                table.aspect_floor > 0.0 && table.aspect_floor <= 100.0,
                "{name} aspect_floor must lie in (0, 100]"
            );
        }
        // Strictness must not decrease from beginner to advanced.
        let pairs = [
            (&self.beginner, &self.intermediate, "intermediate"),
            (&self.intermediate, &self.advanced, "advanced"),
        ];
        for (lower, higher, name) in pairs {
            ensure!(
                higher.excellent >= lower.excellent
                    && higher.good >= lower.good
                    && higher.fair >= lower.fair,
                "{name} thresholds must be at least as strict as the level below"
            );
        }
        Ok(())
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub analysis: AnalysisConfig,
    pub alignment: AlignmentConfig,
    pub scoring: ScoringConfig,
    pub feedback: FeedbackTables,
}

impl EngineConfig {
    /// Load and validate a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config at {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse engine config at {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;
        self.scoring.validate()?;
        self.feedback.validate()?;
        Ok(())
    }
}

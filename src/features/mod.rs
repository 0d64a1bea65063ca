//! Acoustic feature extraction: one [`AudioClip`] in, one immutable
//! [`FeatureBundle`] out.

mod mel;
mod pitch;

use tracing::debug;

use crate::audio::resample::linear_resample;
use crate::config::AnalysisConfig;
use crate::error::{EngineError, Result};
use crate::types::{AudioClip, FeatureBundle};

/// Turns raw waveforms into the descriptors scoring operates on.
///
/// Pure function of the clip and configuration; extraction of the same clip
/// always yields bit-identical bundles.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: AnalysisConfig,
}

impl FeatureExtractor {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn extract(&self, clip: &AudioClip) -> Result<FeatureBundle> {
        if clip.samples.is_empty() {
            return Err(EngineError::UnreadableAudio("clip has no samples".into()));
        }
        if clip.sample_rate == 0 {
            return Err(EngineError::UnreadableAudio(
                "clip sample rate is zero".into(),
            ));
        }
        let peak = clip.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        if peak < self.config.silence_floor {
            return Err(EngineError::UnreadableAudio(format!(
                "clip is silent (peak amplitude {peak:e})"
            )));
        }

        let duration_secs = clip.duration_secs();
        let samples = self.ensure_sample_rate(clip)?;

        let rms_mean = root_mean_square(&samples);
        let mfcc = mel::compute_mfcc(&samples, &self.config)?;
        let pitch = pitch::track_pitch(&samples, &self.config);

        debug!(
            frames = mfcc.nrows(),
            duration_secs,
            pitch_mean = pitch.mean_hz,
            pitch_confident = pitch.confident,
            "extracted feature bundle"
        );

        Ok(FeatureBundle {
            duration_secs,
            pitch_mean: pitch.mean_hz,
            pitch_std: pitch.std_hz,
            pitch_confident: pitch.confident,
            rms_mean,
            mfcc,
        })
    }

    fn ensure_sample_rate(&self, clip: &AudioClip) -> Result<Vec<f32>> {
        if clip.sample_rate == self.config.sample_rate {
            Ok(clip.samples.clone())
        } else {
            linear_resample(&clip.samples, clip.sample_rate, self.config.sample_rate)
        }
    }
}

fn root_mean_square(samples: &[f32]) -> f64 {
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum / samples.len().max(1) as f64).sqrt()
}

use aus::analysis;

use crate::config::AnalysisConfig;

/// Summary statistics of the fundamental-frequency track.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PitchStats {
    pub mean_hz: f64,
    pub std_hz: f64,
    /// False when no frame carried reliable periodicity; mean and std are
    /// both zero in that case.
    pub confident: bool,
}

/// Estimate pitch statistics over voiced frames via the pYIN tracker.
///
/// Unvoiced frames are excluded from the statistics entirely; a clip with no
/// voiced frame at all (whispered or purely fricative input) degrades to a
/// zeroed, low-confidence result rather than an error.
pub(crate) fn track_pitch(samples: &[f32], config: &AnalysisConfig) -> PitchStats {
    let audio: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
    let frame_len = config.window_samples();
    let (_timestamps, pitches, voiced_flags, _confidence) = analysis::pyin_pitch_estimator(
        &audio,
        config.sample_rate,
        config.pitch_floor_hz,
        config.pitch_ceiling_hz,
        frame_len,
    );

    let voiced: Vec<f64> = pitches
        .iter()
        .zip(voiced_flags.iter())
        .filter_map(|(&pitch, &flag)| (flag && pitch.is_finite() && pitch > 0.0).then_some(pitch))
        .collect();

    if voiced.is_empty() {
        return PitchStats {
            mean_hz: 0.0,
            std_hz: 0.0,
            confident: false,
        };
    }

    let count = voiced.len() as f64;
    let mean = voiced.iter().sum::<f64>() / count;
    let variance = voiced.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / count;
    PitchStats {
        mean_hz: mean,
        std_hz: variance.sqrt(),
        confident: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f32, secs: f32, rate: u32) -> Vec<f32> {
        let total = (rate as f32 * secs) as usize;
        (0..total)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / rate as f32).sin() * 0.5)
            .collect()
    }

    #[test]
    fn recovers_tone_frequency() {
        let config = AnalysisConfig::default();
        let stats = track_pitch(&tone(210.0, 1.0, config.sample_rate), &config);
        assert!(stats.confident);
        assert!(
            (stats.mean_hz - 210.0).abs() < 15.0,
            "mean_hz = {}",
            stats.mean_hz
        );
    }

    #[test]
    fn zero_signal_is_low_confidence() {
        let config = AnalysisConfig::default();
        let stats = track_pitch(&vec![0.0; 16_000], &config);
        assert!(!stats.confident);
        assert_eq!(stats.mean_hz, 0.0);
        assert_eq!(stats.std_hz, 0.0);
    }
}

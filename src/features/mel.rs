use aus::analysis;
use aus::analysis::mel::MelFilterbank;
use aus::spectrum;
use aus::WindowType;
use ndarray::Array2;

use crate::config::AnalysisConfig;
use crate::error::{EngineError, Result};

const MIN_FREQ: f64 = 20.0;
const EPSILON: f32 = 1e-12;

/// Compute the frame-major MFCC matrix for already-resampled mono samples.
///
/// Pipeline: Hanning STFT over `window_ms`/`hop_ms`, power spectrogram, mel
/// filterbank, cepstral transform, then per-clip mean/variance normalization
/// so matrices from different recordings live on a comparable scale.
pub(crate) fn compute_mfcc(samples: &[f32], config: &AnalysisConfig) -> Result<Array2<f32>> {
    let audio: Vec<f64> = samples.iter().map(|&s| s as f64).collect();

    let fft_size = config.window_samples();
    let hop_size = config.hop_samples();

    let stft = spectrum::rstft(&audio, fft_size, hop_size, WindowType::Hanning);
    let (magnitude, _) = spectrum::complex_to_polar_rstft(&stft);
    let power = analysis::make_power_spectrogram(&magnitude);

    let freqs = spectrum::rfftfreq(fft_size, config.sample_rate);
    let filterbank = MelFilterbank::new(
        MIN_FREQ,
        (config.sample_rate as f64) / 2.0,
        config.mel_bands,
        &freqs,
        true,
    );
    let mel = analysis::mel::make_mel_spectrogram(&power, &filterbank);
    let mfcc_raw = analysis::mel::mfcc_spectrogram(&mel, config.mfcc_count, None);

    let mfcc = array_from_vec2(&mfcc_raw);
    if mfcc.nrows() == 0 {
        return Err(EngineError::UnreadableAudio(
            "clip yields zero analysis frames".into(),
        ));
    }
    Ok(normalize(&mfcc))
}

fn array_from_vec2(data: &[Vec<f64>]) -> Array2<f32> {
    if data.is_empty() {
        return Array2::zeros((0, 0));
    }
    let rows = data.len();
    let cols = data[0].len();
    let mut flat = Vec::with_capacity(rows * cols);
    for row in data {
        flat.extend(row.iter().map(|v| *v as f32));
    }
    Array2::from_shape_vec((rows, cols), flat).expect("rectangular MFCC frames")
}

/// Per-clip cepstral mean/variance normalization.
fn normalize(input: &Array2<f32>) -> Array2<f32> {
    let mean = input.mean().unwrap_or(0.0);
    let variance = input.mapv(|v| (v - mean).powi(2)).sum() / (input.len() as f32).max(1.0);
    let std_dev = variance.sqrt().max(EPSILON);
    input.mapv(|v| (v - mean) / std_dev)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_centers_and_scales() {
        let raw = Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let normalized = normalize(&raw);
        assert!(normalized.mean().unwrap().abs() < 1e-6);
        let variance = normalized.mapv(|v| v * v).sum() / 4.0;
        assert!((variance - 1.0).abs() < 1e-4);
    }

    #[test]
    fn tone_produces_expected_frame_count() {
        let config = AnalysisConfig::default();
        let samples: Vec<f32> = (0..16_000)
            .map(|i| (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 16_000.0).sin() * 0.5)
            .collect();
        let mfcc = compute_mfcc(&samples, &config).unwrap();
        assert_eq!(mfcc.ncols(), config.mfcc_count);
        // One second at a 10 ms hop lands near 100 frames; exact count
        // depends on the STFT's edge handling.
        assert!(mfcc.nrows() >= 90 && mfcc.nrows() <= 110, "{}", mfcc.nrows());
    }
}

use std::fs;
use std::path::Path;
use std::sync::Arc;

use accentor::catalog::ReferenceCatalog;
use accentor::features::FeatureExtractor;
use accentor::EngineError;

const SAMPLE_RATE: u32 = 16_000;

#[test]
fn phrase_resolution_applies_key_normalization() {
    let dir = tempfile::tempdir().unwrap();
    write_tone(&dir.path().join("maayong_buntag_ref.wav"), 210.0, 0.8);

    let catalog = ReferenceCatalog::new(dir.path(), FeatureExtractor::default());
    let bundle = catalog.features_for("  Maayong Buntag!  ").unwrap();
    assert!(bundle.frame_count() > 0);
    assert!(bundle.duration_secs > 0.7 && bundle.duration_secs < 0.9);
}

#[test]
fn entries_are_cached_after_first_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hello_ref.wav");
    write_tone(&path, 200.0, 0.6);

    let catalog = ReferenceCatalog::new(dir.path(), FeatureExtractor::default());
    let first = catalog.features_for("hello").unwrap();

    // Removing the file proves the second lookup is served from cache.
    fs::remove_file(&path).unwrap();
    let second = catalog.features_for("hello").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn concurrent_first_requests_converge_to_one_bundle() {
    let dir = tempfile::tempdir().unwrap();
    write_tone(&dir.path().join("shared_ref.wav"), 220.0, 0.6);

    let catalog = Arc::new(ReferenceCatalog::new(
        dir.path(),
        FeatureExtractor::default(),
    ));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let catalog = Arc::clone(&catalog);
            std::thread::spawn(move || catalog.features_for("shared").unwrap())
        })
        .collect();

    let bundles: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for bundle in &bundles[1..] {
        assert!(Arc::ptr_eq(&bundles[0], bundle));
    }
}

#[test]
fn missing_reference_is_an_explicit_error() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = ReferenceCatalog::new(dir.path(), FeatureExtractor::default());
    let err = catalog.features_for("nothing here").unwrap_err();
    assert!(matches!(err, EngineError::ReferenceNotFound { .. }));
}

fn write_tone(path: &Path, freq: f32, secs: f32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let total = (SAMPLE_RATE as f32 * secs) as usize;
    for index in 0..total {
        let sample =
            (2.0 * std::f32::consts::PI * freq * index as f32 / SAMPLE_RATE as f32).sin() * 0.4;
        writer
            .write_sample((sample * i16::MAX as f32) as i16)
            .unwrap();
    }
    writer.finalize().unwrap();
}

//! Reference catalog: resolves a normalized phrase key to the cached
//! feature bundle of its reference recording.
//!
//! The catalog is the only shared structure in the engine. Entries are built
//! lazily, at most once per key: a per-key slot lock serializes the first
//! extraction while leaving other keys fully concurrent, and every later
//! lookup clones the shared `Arc`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use crate::audio::decode_bytes;
use crate::error::{EngineError, Result};
use crate::features::FeatureExtractor;
use crate::types::FeatureBundle;

const REFERENCE_EXTENSIONS: [&str; 4] = ["wav", "mp3", "ogg", "flac"];

type Slot = Arc<Mutex<Option<Arc<FeatureBundle>>>>;

pub struct ReferenceCatalog {
    root: PathBuf,
    extractor: FeatureExtractor,
    entries: Mutex<HashMap<String, Slot>>,
}

impl ReferenceCatalog {
    /// Create a catalog over a directory of `<key>_ref.<ext>` recordings.
    pub fn new(root: impl Into<PathBuf>, extractor: FeatureExtractor) -> Self {
        Self {
            root: root.into(),
            extractor,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up (and, on first use, extract) the reference features for a
    /// phrase. Extraction for a given key happens at most once even under
    /// concurrent first requests.
    pub fn features_for(&self, phrase: &str) -> Result<Arc<FeatureBundle>> {
        let key = normalize_key(phrase);
        let slot = self.slot_for(&key);
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bundle) = guard.as_ref() {
            debug!(key = %key, "reference catalog hit");
            return Ok(Arc::clone(bundle));
        }

        let path = self
            .resolve_path(&key)
            .ok_or_else(|| EngineError::ReferenceNotFound {
                phrase: phrase.trim().to_string(),
            })?;
        let bundle = Arc::new(self.extract_reference(&path)?);
        info!(key = %key, path = %path.display(), "reference features cached");
        *guard = Some(Arc::clone(&bundle));
        Ok(bundle)
    }

    /// Seed the catalog with an already-extracted bundle, bypassing file
    /// resolution. Used when the reference store hands over features
    /// directly.
    pub fn insert(&self, phrase: &str, bundle: FeatureBundle) {
        let key = normalize_key(phrase);
        let slot = self.slot_for(&key);
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        guard.get_or_insert_with(|| Arc::new(bundle));
    }

    fn slot_for(&self, key: &str) -> Slot {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(entries.entry(key.to_string()).or_default())
    }

    fn resolve_path(&self, key: &str) -> Option<PathBuf> {
        REFERENCE_EXTENSIONS.iter().find_map(|ext| {
            let candidate = self.root.join(format!("{key}_ref.{ext}"));
            candidate.is_file().then_some(candidate)
        })
    }

    fn extract_reference(&self, path: &Path) -> Result<FeatureBundle> {
        let bytes = fs::read(path).map_err(|err| {
            EngineError::UnreadableAudio(format!(
                "failed to read reference file {}: {err}",
                path.display()
            ))
        })?;
        let extension = path.extension().and_then(|ext| ext.to_str());
        let clip = decode_bytes(bytes, extension)?;
        self.extractor.extract(&clip)
    }
}

/// Normalize a free-text phrase into a filesystem-safe catalog key:
/// lowercase, trimmed, punctuation stripped, separators collapsed to
/// underscores.
pub fn normalize_key(phrase: &str) -> String {
    phrase
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' | '-' => Some('_'),
            '\'' | ',' | '?' | '!' | '.' => None,
            other => Some(other),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_whitespace_and_punctuation() {
        assert_eq!(normalize_key("  How are you?  "), "how_are_you");
        assert_eq!(normalize_key("Don't stop!"), "dont_stop");
        assert_eq!(normalize_key("well-known"), "well_known");
        assert_eq!(normalize_key("Maayong buntag"), "maayong_buntag");
    }

    #[test]
    fn unknown_phrase_is_reported_not_defaulted() {
        let catalog = ReferenceCatalog::new("/nonexistent", FeatureExtractor::default());
        let err = catalog.features_for("missing phrase").unwrap_err();
        assert!(matches!(err, EngineError::ReferenceNotFound { ref phrase } if phrase == "missing phrase"));
    }

    #[test]
    fn inserted_bundle_is_served_without_file_resolution() {
        use ndarray::Array2;
        let catalog = ReferenceCatalog::new("/nonexistent", FeatureExtractor::default());
        catalog.insert(
            "Hello World",
            crate::types::FeatureBundle {
                duration_secs: 1.0,
                pitch_mean: 180.0,
                pitch_std: 12.0,
                pitch_confident: true,
                rms_mean: 0.2,
                mfcc: Array2::zeros((4, 13)),
            },
        );
        let bundle = catalog.features_for("hello world").unwrap();
        assert_eq!(bundle.frame_count(), 4);
    }
}

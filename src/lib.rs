//! accentor — pronunciation-scoring engine.
//!
//! Compares a learner's recording of a phrase against a reference
//! pronunciation: acoustic features are extracted from both clips, their
//! MFCC trajectories are aligned with dynamic time warping, the alignment
//! distortion and prosodic deltas are folded into a 0-100 score, and the
//! score is rendered as level-aware feedback.
//!
//! Every stage is a pure function of its inputs; the only shared state is
//! the lazily populated [`ReferenceCatalog`], which is safe for concurrent
//! use. Evaluations are independent and may run fully in parallel.

pub mod align;
pub mod audio;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod feedback;
pub mod score;
pub mod types;

use std::sync::Arc;

use tracing::info;

use crate::align::DtwAligner;
use crate::catalog::ReferenceCatalog;
use crate::config::EngineConfig;
use crate::features::FeatureExtractor;
use crate::feedback::FeedbackGenerator;
use crate::score::ScoreAggregator;

pub use crate::error::{EngineError, Result};
pub use crate::types::{
    Aspect, AspectScore, AudioClip, EvaluationResult, FeatureBundle, ProficiencyLevel, Rating,
};

/// End-to-end evaluation pipeline: decode, extract, align, aggregate,
/// generate.
///
/// Stateless apart from the injected catalog; a single `Evaluator` may serve
/// concurrent requests.
pub struct Evaluator {
    extractor: FeatureExtractor,
    aligner: DtwAligner,
    aggregator: ScoreAggregator,
    feedback: FeedbackGenerator,
    catalog: Arc<ReferenceCatalog>,
}

impl Evaluator {
    pub fn new(config: EngineConfig, catalog: Arc<ReferenceCatalog>) -> Self {
        Self {
            extractor: FeatureExtractor::new(config.analysis.clone()),
            aligner: DtwAligner::new(config.alignment.clone()),
            aggregator: ScoreAggregator::new(config.scoring.clone()),
            feedback: FeedbackGenerator::new(config.feedback.clone()),
            catalog,
        }
    }

    /// Build an evaluator whose catalog resolves `<key>_ref.<ext>` files
    /// under `reference_dir`, sharing the evaluator's analysis settings.
    pub fn with_reference_dir(config: EngineConfig, reference_dir: impl Into<std::path::PathBuf>) -> Self {
        let catalog = Arc::new(ReferenceCatalog::new(
            reference_dir,
            FeatureExtractor::new(config.analysis.clone()),
        ));
        Self::new(config, catalog)
    }

    pub fn catalog(&self) -> &Arc<ReferenceCatalog> {
        &self.catalog
    }

    /// Evaluate an encoded audio payload against the reference for `phrase`.
    pub fn evaluate(
        &self,
        payload: Vec<u8>,
        extension_hint: Option<&str>,
        phrase: &str,
        level: ProficiencyLevel,
    ) -> Result<EvaluationResult> {
        let clip = audio::decode_bytes(payload, extension_hint)?;
        self.evaluate_clip(&clip, phrase, level)
    }

    /// Evaluate an already-decoded clip against the reference for `phrase`.
    pub fn evaluate_clip(
        &self,
        clip: &AudioClip,
        phrase: &str,
        level: ProficiencyLevel,
    ) -> Result<EvaluationResult> {
        let user = self.extractor.extract(clip)?;
        let reference = self.catalog.features_for(phrase)?;
        self.evaluate_bundles(&user, &reference, level)
    }

    /// Core comparison for callers that already hold both feature bundles.
    pub fn evaluate_bundles(
        &self,
        user: &FeatureBundle,
        reference: &FeatureBundle,
        level: ProficiencyLevel,
    ) -> Result<EvaluationResult> {
        let alignment = self.aligner.align(&user.mfcc, &reference.mfcc)?;
        let (score, aspects) = self.aggregator.aggregate(alignment.normalized_cost, user, reference);
        let result = self.feedback.generate(score, aspects, level);
        info!(
            score = result.pronunciation_score,
            rating = %result.rating,
            normalized_cost = alignment.normalized_cost as f64,
            level = %level,
            "evaluation complete"
        );
        Ok(result)
    }
}

//! Feedback generation: map the numeric score and aspect deltas to a rating,
//! comments, and a practice tip, calibrated to the learner's declared level.
//!
//! The scoring engine itself is level-agnostic; this module is the only
//! place proficiency influences the outcome, through the per-level
//! threshold tables in configuration.

use crate::config::{FeedbackTables, LevelThresholds};
use crate::types::{Aspect, AspectScore, EvaluationResult, ProficiencyLevel, Rating};

/// Renders an [`EvaluationResult`] from the aggregated scores. Pure mapping;
/// no I/O and no external calls.
#[derive(Debug, Clone, Default)]
pub struct FeedbackGenerator {
    tables: FeedbackTables,
}

impl FeedbackGenerator {
    pub fn new(tables: FeedbackTables) -> Self {
        Self { tables }
    }

    pub fn generate(
        &self,
        pronunciation_score: f64,
        mut aspect_scores: Vec<AspectScore>,
        level: ProficiencyLevel,
    ) -> EvaluationResult {
        let thresholds = self.tables.level(level);
        let rating = rating_for(pronunciation_score, thresholds);

        for aspect in &mut aspect_scores {
            aspect.comment = comment_for(aspect, thresholds).to_string();
        }

        let tips = tip_for(&aspect_scores, thresholds, level).to_string();

        EvaluationResult {
            pronunciation_score,
            rating,
            overall: overall_message(rating).to_string(),
            aspect_scores,
            tips,
            level,
        }
    }
}

/// The bands are contiguous and exhaustive over [0, 100] by construction:
/// one strict cascade with an unconditional tail.
fn rating_for(score: f64, thresholds: &LevelThresholds) -> Rating {
    if score >= thresholds.excellent {
        Rating::Excellent
    } else if score >= thresholds.good {
        Rating::Good
    } else if score >= thresholds.fair {
        Rating::Fair
    } else {
        Rating::NeedsImprovement
    }
}

fn overall_message(rating: Rating) -> &'static str {
    match rating {
        Rating::Excellent => "Great job! Your pronunciation is very close to the reference.",
        Rating::Good => "Good pronunciation! Keep practicing to improve further.",
        Rating::Fair => "Fair pronunciation. Focus on the aspects mentioned below.",
        Rating::NeedsImprovement => "Keep practicing! Pay attention to the feedback below.",
    }
}

fn comment_for(aspect: &AspectScore, thresholds: &LevelThresholds) -> &'static str {
    if aspect.score >= thresholds.aspect_floor {
        return match aspect.aspect {
            Aspect::Pitch => "Your pitch is good!",
            Aspect::Timing => "Your timing is excellent!",
            Aspect::Volume => "Your volume matches the reference well.",
        };
    }
    match (aspect.aspect, aspect.delta > 0.0) {
        (Aspect::Pitch, true) => {
            "Your pitch is higher than the reference. Try speaking a bit lower."
        }
        (Aspect::Pitch, false) => {
            "Your pitch is lower than the reference. Try speaking a bit higher."
        }
        (Aspect::Timing, true) => {
            "You're speaking more slowly than the reference. Try to match its pace."
        }
        (Aspect::Timing, false) => "You're speaking quickly. Try to slow down slightly.",
        (Aspect::Volume, true) => "Try speaking a bit softer to match the reference.",
        (Aspect::Volume, false) => "Try speaking a bit louder for clearer pronunciation.",
    }
}

/// One actionable suggestion keyed by the weakest aspect; when every aspect
/// clears the floor, fall back to general advice for the level.
fn tip_for(
    aspects: &[AspectScore],
    thresholds: &LevelThresholds,
    level: ProficiencyLevel,
) -> &'static str {
    let weakest = aspects.iter().min_by(|a, b| {
        a.score
            .partial_cmp(&b.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    match weakest {
        Some(aspect) if aspect.score < thresholds.aspect_floor => match aspect.aspect {
            Aspect::Pitch => "Hum the phrase first to internalize its melody, then add the words.",
            Aspect::Timing => "Shadow the reference audio and match its rhythm before working on individual sounds.",
            Aspect::Volume => "Keep a steady distance from the microphone and aim for an even loudness.",
        },
        _ => match level {
            ProficiencyLevel::Beginner => {
                "Focus on listening to native speakers and repeating after them."
            }
            ProficiencyLevel::Intermediate => {
                "Pay attention to subtle sound differences and intonation patterns."
            }
            ProficiencyLevel::Advanced => {
                "Work on perfecting the nuances and natural flow of speech."
            }
        },
    }
}

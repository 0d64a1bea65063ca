use thiserror::Error;

/// Convenient alias for results returned by engine modules.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures the scoring engine can surface to its caller.
///
/// None of these are retryable: every variant is a deterministic function of
/// the inputs, so the caller must change the request (new audio, valid
/// phrase) rather than retry.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The audio payload could not be decoded, or decoded to nothing usable
    /// (empty, silent, zero analysis frames).
    #[error("unreadable audio: {0}")]
    UnreadableAudio(String),

    /// No reference recording is known for the requested phrase.
    #[error("no reference audio found for phrase {phrase:?}")]
    ReferenceNotFound { phrase: String },

    /// An empty feature sequence reached the aligner. Upstream extraction
    /// guarantees at least one frame, so this indicates an internal bug.
    #[error("degenerate feature sequence: {0}")]
    DegenerateSequence(&'static str),
}

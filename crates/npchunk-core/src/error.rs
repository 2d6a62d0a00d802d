use thiserror::Error;

/// Errors that can occur while featurizing, decoding or scoring.
///
/// Every variant is fatal for the run that raised it. Zero denominators in
/// scoring are not errors; those metrics are reported as `0.0`.
#[derive(Debug, Error)]
pub enum ChunkerError {
    /// Reading or writing a corpus, feature or model file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An input row could not be parsed into the expected fields.
    #[error("malformed input at line {line}: {reason}")]
    MalformedLine {
        /// 1-based line number in the offending input.
        line: usize,
        /// What was wrong with the row.
        reason: String,
    },

    /// Output line structure diverged from its source.
    #[error("alignment error: expected {expected}, found {found} ({detail})")]
    Alignment {
        /// What the source layout required.
        expected: String,
        /// What the output actually contained.
        found: String,
        /// Where the divergence was detected.
        detail: String,
    },

    /// A previous-label placeholder was resolved with no sentence in progress.
    #[error("placeholder substitution outside an active sentence: {0}")]
    UnknownFeatureContext(String),

    /// The classifier could not train or score a feature vector.
    #[error("classifier failure: {0}")]
    Classifier(String),

    /// A label outside the configured BIO scheme.
    #[error("unknown label {label:?} at {location}")]
    UnknownLabel {
        /// The offending label string.
        label: String,
        /// Human-readable position (line or sentence/token).
        location: String,
    },

    /// Key and response disagree on a token's text.
    #[error("token mismatch at line {line}: key={key:?} response={response:?}")]
    TokenMismatch {
        /// 1-based line number shared by both files.
        line: usize,
        /// Token text in the key file.
        key: String,
        /// Token text in the response file.
        response: String,
    },

    /// A regex pattern failed to compile (should not happen with static patterns).
    #[error("regex compilation error: {0}")]
    RegexError(#[from] regex::Error),

    /// A configuration value is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Model (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for chunker operations.
pub type Result<T> = std::result::Result<T, ChunkerError>;

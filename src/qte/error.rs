//! Engine error types.

use std::path::PathBuf;

/// Authoring and loading errors.
///
/// Detected before a sequence starts; a sequence with any of these never
/// arms its first challenge.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Sequence has no challenges.
    #[error("sequence '{sequence}' has no challenges")]
    EmptySequence {
        /// Sequence name.
        sequence: String,
    },

    /// Challenge accepts no inputs.
    #[error("challenge {index} has an empty acceptable-input set")]
    EmptyInputs {
        /// Challenge index within its sequence.
        index: usize,
    },

    /// Thresholds decrease somewhere between ok and perfect.
    #[error("challenge {index} thresholds are not ascending (ok={ok}, good={good}, great={great}, perfect={perfect})")]
    NonAscendingThresholds {
        /// Challenge index within its sequence.
        index: usize,
        /// Ok threshold.
        ok: f32,
        /// Good threshold.
        good: f32,
        /// Great threshold.
        great: f32,
        /// Perfect threshold.
        perfect: f32,
    },

    /// A threshold is negative, NaN or infinite.
    #[error("challenge {index} has an invalid threshold value")]
    InvalidThreshold {
        /// Challenge index within its sequence.
        index: usize,
    },

    /// Mash challenge with nothing to mash.
    #[error("challenge {index} is a mash challenge with zero required presses")]
    ZeroRequiredPresses {
        /// Challenge index within its sequence.
        index: usize,
    },

    /// Challenge with an empty time window.
    #[error("challenge {index} has a zero duration")]
    ZeroDuration {
        /// Challenge index within its sequence.
        index: usize,
    },

    /// Engine cannot convert milliseconds to ticks.
    #[error("engine tick_rate must be greater than zero")]
    ZeroTickRate,

    /// Damage floor outside `0.0..=1.0`.
    #[error("engine min_damage_scale must be within 0..=1, got {value}")]
    InvalidMinDamageScale {
        /// Configured value.
        value: f32,
    },

    /// Penalty that is negative, NaN or infinite.
    #[error("engine misinput_penalty must be finite and non-negative, got {value}")]
    InvalidMisinputPenalty {
        /// Configured value.
        value: f32,
    },

    /// Invalid sequence inside a library.
    #[error("sequence '{name}': {source}")]
    InSequence {
        /// Library key.
        name: String,
        /// Underlying error.
        #[source]
        source: Box<ConfigError>,
    },

    /// Config file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Config document is not valid JSON for the expected schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Engine errors returned to the host.
#[derive(Debug, thiserror::Error)]
pub enum QteError {
    /// Sequence configuration rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A sequence is already in flight; the engine is single-focus.
    #[error("sequence '{running}' is already running")]
    SequenceAlreadyRunning {
        /// Name of the running sequence.
        running: String,
    },
}

//! Error types shared by every stage of the generation pipeline.

use std::fmt;

/// Result alias used throughout the crate.
pub type GenerateResult<T> = Result<T, GenerateError>;

/// Why the rarity selector could not produce a piece for a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exhaustion {
    /// Tag and variant filtering removed every candidate.
    NoCandidates,
    /// Candidates survived filtering but their weights sum to zero.
    ZeroWeight,
}

impl fmt::Display for Exhaustion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCandidates => f.write_str("no candidate survived tag/variant filtering"),
            Self::ZeroWeight => f.write_str("total rarity weight is zero"),
        }
    }
}

/// A job that produced an error instead of an asset.
#[derive(Debug)]
pub struct JobFailure {
    /// Index of the failed job.
    pub job: usize,
    /// The error the job produced.
    pub error: GenerateError,
}

#[derive(thiserror::Error, Debug)]
pub enum GenerateError {
    /// A source artwork file required by a chosen piece does not exist.
    #[error("piece artwork not found: {path}")]
    ConfigInputMissing { path: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Image data could not be decoded or encoded.
    #[error("codec error for {context}: {message}")]
    Codec { context: String, message: String },

    #[error("selection exhausted for layer '{layer}': {reason}")]
    SelectionExhausted { layer: String, reason: Exhaustion },

    /// A layer's pixel bounds differ from layer 0.
    #[error(
        "layer {index} is {found_width}x{found_height}, canvas is {expected_width}x{expected_height}"
    )]
    DimensionMismatch {
        index: usize,
        expected_width: u32,
        expected_height: u32,
        found_width: u32,
        found_height: u32,
    },

    #[error("{remaining} duplicate image(s) remain after {passes} regeneration pass(es)")]
    CollisionUnresolved { passes: usize, remaining: usize },

    /// The configuration cannot produce any asset.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// The run stopped because `job` failed.
    #[error("generation aborted by job {job}: {source}")]
    Aborted {
        job: usize,
        #[source]
        source: Box<GenerateError>,
        /// Other failures observed before the run stopped.
        failures: Vec<JobFailure>,
    },
}

impl GenerateError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn codec(context: impl Into<String>, err: impl fmt::Display) -> Self {
        Self::Codec {
            context: context.into(),
            message: err.to_string(),
        }
    }

    pub fn exhausted(layer: impl Into<String>, reason: Exhaustion) -> Self {
        Self::SelectionExhausted {
            layer: layer.into(),
            reason,
        }
    }

    /// Returns true for errors that doom every job, not just the one that hit them.
    pub fn is_run_fatal(&self) -> bool {
        matches!(self, Self::InvalidConfig(_) | Self::Aborted { .. })
    }
}

impl From<serde_json::Error> for GenerateError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

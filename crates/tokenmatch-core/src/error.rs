//! Error types

use thiserror::Error;

/// Errors raised while building a comparator from its configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The metric lacks a capability the intersection strategy needs
    #[error("{strategy} intersection requires an aligning metric, but '{metric}' cannot align")]
    Capability {
        strategy: &'static str,
        metric: String,
    },

    /// Threshold outside [0, 1] or not finite
    #[error("threshold must be a finite value in [0, 1], got {0}")]
    InvalidThreshold(f64),

    /// q-gram length of zero
    #[error("q-gram length must be at least 1, got {0}")]
    InvalidQval(usize),

    /// Unrecognized variant name for a configuration enum
    #[error("unknown {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },

    /// Malformed JSON configuration
    #[error("invalid configuration JSON: {0}")]
    Json(String),
}

/// Errors raised by the assignment solver
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssignmentError {
    /// A cost is NaN, infinite or negative
    #[error("invalid cost {value} at ({row}, {col}): costs must be finite and non-negative")]
    InvalidCostMatrix { row: usize, col: usize, value: f64 },

    /// Data buffer does not match the declared shape
    #[error("cost matrix of {rows}x{cols} cannot hold {len} values")]
    Shape { rows: usize, cols: usize, len: usize },
}

/// Any error the engine can produce
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Assignment(#[from] AssignmentError),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

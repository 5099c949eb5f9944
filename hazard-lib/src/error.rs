//! Error taxonomy shared across every module boundary.
//!
//! Variant names track the error *kinds* of the hazard pipeline's failure
//! semantics rather than the module that raised them: a bad site latitude
//! and a non-monotonic XY grid are both [`HazardError::InputValidation`].

use thiserror::Error;

/// Unified error type for `hazard-lib`.
#[derive(Debug, Error)]
pub enum HazardError {
    /// Bad argument at a public contract boundary (lat out of range,
    /// negative weight, non-monotonic x-grid). Not retried.
    #[error("input validation failed: {0}")]
    InputValidation(String),

    /// Model files missing or inconsistent (coefficient table missing an
    /// IMT column, logic tree that fails to build). Fatal for the run.
    #[error("model integrity error: {0}")]
    ModelIntegrity(String),

    /// NaN or ±∞ produced by a per-rupture computation. The rupture that
    /// produced it is dropped by the caller; this variant exists so the
    /// drop can be logged with context.
    #[error("arithmetic degenerate result: {0}")]
    ArithmeticDegenerate(String),

    /// A GMM was invoked outside its declared parameter domain. Recoverable:
    /// the caller still computes a value but should flag it in metadata.
    #[error("input out of GMM-declared range: {0}")]
    InputOutOfRange(String),

    /// Reducer wall-clock bound exceeded; partial results must be discarded.
    #[error("computation timed out: {0}")]
    TimedOut(String),

    /// Invariant violation indicating a bug (weights don't sum to 1 after
    /// build, xs-hash mismatch in curve addition).
    #[error("internal invariant violated: {0}")]
    Internal(String),

    /// Wraps I/O errors from reading model/site/config files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Wraps CSV (de)serialization errors.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Wraps JSON (de)serialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Wraps GeoJSON parsing errors.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

/// Convenience alias used throughout the crate.
pub type HazardResult<T> = Result<T, HazardError>;

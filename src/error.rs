//! Error handling
//!
//! Central error taxonomy for the core. Duplicate detections are not an
//! error anywhere in this crate: they are silently dropped and reflected
//! only in refresh counts.

use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Rejected before persistence: out-of-band coordinates, confidence
    /// outside [0,100], malformed date. Never silently clamped.
    #[error("validation error: {0}")]
    Validation(String),

    /// Upstream satellite feed unreachable or returned a malformed payload.
    /// Surfaced as a refresh failure with zero new records; retry policy
    /// belongs to the caller.
    #[error("satellite feed unavailable: {0}")]
    FeedUnavailable(String),

    /// Training attempted with too little history. The previously published
    /// model artifact, if any, is left untouched.
    #[error("insufficient data for training: {0}")]
    InsufficientData(String),

    /// Prediction generation attempted with no completed model artifact.
    #[error("no trained model available; train a model first")]
    ModelNotTrained,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

//! Errors raised by the drift pipeline.
//!
//! Bounds errors ([`DriftError::StationOutOfRange`],
//! [`DriftError::TimestampOutOfRange`]) are logic defects: the scheduler aborts
//! the current run when it sees one. The remaining variants come from explicit
//! `validate()` calls made by collaborators before data or settings are handed
//! to the pipeline.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DriftError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DriftError {
    /// A buffer write addressed a station row that was never allocated.
    #[error("station index {index} out of range (buffer holds {count} stations)")]
    StationOutOfRange { index: usize, count: usize },

    /// A buffer write addressed a day outside the allocated timespan.
    #[error("timestamp {timestamp} outside buffer range [{start}, {end}]")]
    TimestampOutOfRange { timestamp: i64, start: i64, end: i64 },

    /// Station record rejected by [`crate::Station::validate`].
    #[error("invalid station '{name}': {reason}")]
    InvalidStation { name: String, reason: String },

    #[error("invalid processing config: {0}")]
    InvalidConfig(String),

    #[error("invalid render parameters: {0}")]
    InvalidRenderParams(String),
}

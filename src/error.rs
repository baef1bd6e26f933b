//! Error types for the `djimeta` crate.
//!
//! Two layers are defined here. [`ParseError`] describes why a single
//! telemetry caption line was rejected; it is recovered locally, counted in
//! the [`ParseReport`](crate::ParseReport) and never aborts a video.
//! [`TelemetryError`] is the error type returned by every fallible operation
//! at the video and batch level, carrying file paths and upstream messages
//! for diagnosis.

use std::{io::Error as IoError, path::PathBuf, time::Duration};

use serde_json::Error as JsonError;
use thiserror::Error;

/// Why a telemetry caption line could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The line has too few comma-separated segments for a required field.
    #[error("Malformed telemetry line: {required} segments required, found {found}")]
    MalformedLine {
        /// Minimum number of segments the positional layout needs.
        required: usize,
        /// Number of segments actually present.
        found: usize,
    },

    /// A field was located but stripped down to nothing.
    #[error("Telemetry field `{field}` is empty")]
    EmptyField {
        /// Wire name of the empty field.
        field: &'static str,
    },
}

/// The unified error type for all `djimeta` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TelemetryError {
    /// The caption dump for a video was missing or unusable.
    #[error("Failed to extract captions from {path}: {reason}")]
    ExtractionFailed {
        /// Video the extraction was attempted on.
        path: PathBuf,
        /// Underlying reason (exit status, stderr excerpt, empty output).
        reason: String,
    },

    /// The caption extraction subprocess exceeded its time budget.
    #[error("Caption extraction for {path} timed out after {timeout:?}")]
    ExtractionTimedOut {
        /// Video the extraction was attempted on.
        path: PathBuf,
        /// The configured limit.
        timeout: Duration,
    },

    /// Duration or resolution could not be read from a video.
    #[error("Failed to probe video {path}: {reason}")]
    ProbeFailed {
        /// Video that was inspected.
        path: PathBuf,
        /// Underlying reason the probe failed.
        reason: String,
    },

    /// The input directory does not exist or is not a directory.
    #[error("Input directory is missing or not a directory: {0}")]
    InvalidInputDirectory(PathBuf),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// A document could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] JsonError),

    /// The batch was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}


//! Parallel batch export.
//!
//! This module provides [`parallel_export`] which distributes per-video
//! work across the rayon thread pool. Videos share no mutable state, so each
//! worker runs the full probe, extract, sample and write pipeline on its own.
//!
//! The public API is exposed through
//! [`BatchExporter::run_parallel`](crate::BatchExporter::run_parallel); this
//! module contains only the internal implementation.

use std::path::PathBuf;
use std::sync::Mutex;

use ::rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::error::TelemetryError;
use crate::exporter::{BatchExporter, VideoExport};

/// Export `videos` in parallel.
///
/// Outcomes are returned in the same order as `videos`, regardless of
/// which worker finished first. Progress is reported as workers finish.
pub(crate) fn parallel_export(
    exporter: &BatchExporter,
    videos: &[PathBuf],
) -> Result<Vec<Result<VideoExport, TelemetryError>>, TelemetryError> {
    let tracker = Mutex::new(exporter.progress_tracker(videos.len()));

    let outcomes: Vec<Option<Result<VideoExport, TelemetryError>>> = videos
        .par_iter()
        .map(|video| {
            if exporter.options().is_cancelled() {
                return None;
            }
            let outcome = exporter.export_video(video);
            if let Ok(mut tracker) = tracker.lock() {
                tracker.advance(Some(video.clone()));
            }
            Some(outcome)
        })
        .collect();

    if let Ok(mut tracker) = tracker.lock() {
        tracker.finish();
    }

    outcomes
        .into_iter()
        .map(|outcome| outcome.ok_or(TelemetryError::Cancelled))
        .collect()
}

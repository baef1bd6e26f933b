//! Batch progress notifications and cooperative cancellation.
//!
//! The exporter reports through a [`ProgressCallback`] after each group of
//! finished videos and polls a [`CancellationToken`] before starting the
//! next one.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use djimeta::{BatchExporter, ExportOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage() {
//!             println!("{pct:.1}% ({} of {:?})", info.current, info.total);
//!         }
//!     }
//! }
//!
//! let options = ExportOptions::new().with_progress(Arc::new(PrintProgress));
//! let report = BatchExporter::with_ffmpeg(options).run()?;
//! # Ok::<(), djimeta::TelemetryError>(())
//! ```

use std::path::PathBuf;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Where a batch stands after its latest finished video.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressInfo {
    /// Videos finished so far, failed ones included.
    pub current: u64,
    /// Videos discovered for this batch.
    pub total: Option<u64>,
    /// The last video finished before this report, if any.
    pub current_video: Option<PathBuf>,
}

impl ProgressInfo {
    /// Share of the batch finished, from 0.0 to 100.0.
    ///
    /// `None` when the total is unknown or zero.
    pub fn percentage(&self) -> Option<f32> {
        self.total
            .filter(|&total| total > 0)
            .map(|total| self.current as f32 / total as f32 * 100.0)
    }
}

/// Receives [`ProgressInfo`] reports while a batch runs.
///
/// Reports may arrive from rayon workers, hence the `Send + Sync` bound.
/// A callback only observes; stopping a batch goes through
/// [`CancellationToken`].
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, info: &ProgressInfo);
}

pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Shared stop flag checked between videos.
///
/// Clones observe the same flag, so a handle kept by a signal handler or UI
/// thread can stop a batch running elsewhere.
///
/// ```
/// use djimeta::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the batch to stop before its next video.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Counts finished videos and reports every `every` of them.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    total: Option<u64>,
    finished: u64,
    every: u64,
    unreported: u64,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, total: Option<u64>, every: u64) -> Self {
        Self {
            callback,
            total,
            finished: 0,
            every: every.max(1),
            unreported: 0,
        }
    }

    pub(crate) fn advance(&mut self, video: Option<PathBuf>) {
        self.finished += 1;
        self.unreported += 1;
        if self.unreported >= self.every {
            self.emit(video);
        }
    }

    /// Report whatever the last partial group left unreported.
    pub(crate) fn finish(&mut self) {
        if self.unreported > 0 {
            self.emit(None);
        }
    }

    fn emit(&mut self, video: Option<PathBuf>) {
        self.unreported = 0;
        self.callback.on_progress(&ProgressInfo {
            current: self.finished,
            total: self.total,
            current_video: video,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<u64>>,
    }

    impl ProgressCallback for Recorder {
        fn on_progress(&self, info: &ProgressInfo) {
            self.seen.lock().unwrap().push(info.current);
        }
    }

    #[test]
    fn tracker_reports_every_group_and_flushes_tail() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker = ProgressTracker::new(recorder.clone(), Some(5), 2);
        for _ in 0..5 {
            tracker.advance(None);
        }
        tracker.finish();
        assert_eq!(*recorder.seen.lock().unwrap(), vec![2, 4, 5]);
    }

    #[test]
    fn tracker_finish_is_silent_after_full_group() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker = ProgressTracker::new(recorder.clone(), Some(2), 2);
        tracker.advance(None);
        tracker.advance(None);
        tracker.finish();
        assert_eq!(*recorder.seen.lock().unwrap(), vec![2]);
    }

    #[test]
    fn percentage_needs_a_nonzero_total() {
        let mut info = ProgressInfo {
            current: 1,
            total: Some(4),
            current_video: None,
        };
        assert_eq!(info.percentage(), Some(25.0));
        info.total = Some(0);
        assert_eq!(info.percentage(), None);
        info.total = None;
        assert_eq!(info.percentage(), None);
    }
}

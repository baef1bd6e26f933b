//! Export configuration.
//!
//! [`ExportOptions`] is a builder that threads directories, sampling
//! settings, subprocess limits, progress callbacks and cancellation tokens
//! through [`BatchExporter`](crate::BatchExporter) without polluting every
//! function signature.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use djimeta::{CancellationToken, ExportOptions};
//!
//! let token = CancellationToken::new();
//! let options = ExportOptions::new()
//!     .with_input_dir("flights/")
//!     .with_interval(5)
//!     .with_extensions(["mp4", ".MOV"])
//!     .with_timeout(Duration::from_secs(30))
//!     .with_cancellation(token.clone());
//! assert_eq!(options.extensions(), ["mp4", "mov"]);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::caption::DEFAULT_FRAME_SENTINEL;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Video file extensions the exporter accepts, lowercase and without dots.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["mp4", "mov", "avi", "mpg", "mkv"];

/// Default directory scanned for videos.
pub const DEFAULT_INPUT_DIR: &str = "dji_videos/";
/// Default directory receiving one JSON document per video.
pub const DEFAULT_EXPORT_DIR: &str = "src_vid_info/";
/// Default path of the batch document.
pub const DEFAULT_BATCH_PATH: &str = "data/data.json";
/// Default sampling interval in timestamp-groups.
pub const DEFAULT_INTERVAL: i64 = 3;
/// Default limit for one caption extraction subprocess.
pub const DEFAULT_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration for a batch export.
///
/// All fields have defaults matching the command-line tool's defaults.
#[derive(Clone)]
pub struct ExportOptions {
    pub(crate) input_dir: PathBuf,
    pub(crate) export_dir: PathBuf,
    pub(crate) batch_path: PathBuf,
    pub(crate) interval: i64,
    pub(crate) extensions: Vec<String>,
    pub(crate) sentinel: String,
    pub(crate) timeout: Duration,
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Cancellation token. `None` means never cancelled.
    pub(crate) cancellation: Option<CancellationToken>,
    /// How often to fire the progress callback (every N videos).
    pub(crate) batch_size: u64,
}

impl Debug for ExportOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExportOptions")
            .field("input_dir", &self.input_dir)
            .field("export_dir", &self.export_dir)
            .field("batch_path", &self.batch_path)
            .field("interval", &self.interval)
            .field("extensions", &self.extensions)
            .field("sentinel", &self.sentinel)
            .field("timeout", &self.timeout)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportOptions {
    /// Create options with the default directories, interval 3, every
    /// allowed extension, a 120 s extraction timeout and no progress or
    /// cancellation.
    pub fn new() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
            batch_path: PathBuf::from(DEFAULT_BATCH_PATH),
            interval: DEFAULT_INTERVAL,
            extensions: ALLOWED_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            sentinel: DEFAULT_FRAME_SENTINEL.to_string(),
            timeout: DEFAULT_EXTRACTION_TIMEOUT,
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
        }
    }

    /// Set the directory scanned for videos.
    #[must_use]
    pub fn with_input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.input_dir = dir.into();
        self
    }

    /// Set the directory receiving per-video documents.
    #[must_use]
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    /// Set the path of the batch document.
    #[must_use]
    pub fn with_batch_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.batch_path = path.into();
        self
    }

    /// Set the sampling interval in timestamp-groups.
    ///
    /// Zero or negative keeps every record.
    #[must_use]
    pub fn with_interval(mut self, interval: i64) -> Self {
        self.interval = interval;
        self
    }

    /// Restrict discovery to the given extensions.
    ///
    /// Extensions are normalised (leading dot removed, lowercased) and
    /// anything outside [`ALLOWED_EXTENSIONS`] is dropped. An empty result
    /// falls back to the full allow-list.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selected: Vec<String> = Vec::new();
        for extension in extensions {
            let normalised = extension
                .as_ref()
                .trim()
                .trim_start_matches('.')
                .to_ascii_lowercase();
            if !ALLOWED_EXTENSIONS.contains(&normalised.as_str()) {
                log::warn!("Ignoring unsupported video format: {}", extension.as_ref());
                continue;
            }
            if !selected.contains(&normalised) {
                selected.push(normalised);
            }
        }
        if selected.is_empty() {
            selected = ALLOWED_EXTENSIONS.iter().map(|ext| ext.to_string()).collect();
        }
        self.extensions = selected;
        self
    }

    /// Set the token that identifies telemetry frame lines.
    #[must_use]
    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    /// Set the limit for one caption extraction subprocess.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token, checked before each video.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires.
    ///
    /// A value of 1 means every video. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Directory scanned for videos.
    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    /// Directory receiving per-video documents.
    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Path of the batch document.
    pub fn batch_path(&self) -> &Path {
        &self.batch_path
    }

    /// Sampling interval in timestamp-groups.
    pub fn interval(&self) -> i64 {
        self.interval
    }

    /// Accepted extensions, lowercase without dots.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Token that identifies telemetry frame lines.
    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    /// Limit for one caption extraction subprocess.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns `true` if cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}

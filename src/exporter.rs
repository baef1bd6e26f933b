//! Batch export of a directory of DJI videos.
//!
//! [`BatchExporter`] is the main entry point for the crate. It discovers
//! videos, runs each one through caption extraction, parsing, sampling and
//! aggregation, writes one JSON document per video, and finally writes the
//! [`BatchDocument`] for the whole run.
//!
//! A video that fails (no caption stream, probe error, unwritable output)
//! is recorded as a [`VideoFailure`] and the batch moves on. Only an
//! unusable input directory, a failed batch write, or cancellation end the
//! run with an error.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Serializer, ser::PrettyFormatter};

use crate::{
    caption::{CaptionClassifier, CaptionEvents},
    configuration::ExportOptions,
    error::TelemetryError,
    ffmpeg::{CaptionSource, FfmpegCaptionSource},
    metadata::{BatchDocument, VideoMetadata},
    probe::{FfprobeInspector, VideoInspector},
    progress::ProgressTracker,
    sampler::IntervalSampler,
    telemetry::TelemetryRecord,
    validation::ParseReport,
};

/// Run a caption dump through classification, parsing and sampling.
///
/// Returns the kept records in caption order together with the parse
/// diagnostics for the whole dump.
///
/// # Example
///
/// ```
/// use djimeta::{DEFAULT_FRAME_SENTINEL, sample_caption_dump};
///
/// let dump = std::fs::read_to_string("tests/fixtures/dji_flight.vtt")?;
/// let (records, report) = sample_caption_dump(&dump, DEFAULT_FRAME_SENTINEL, 1);
/// assert_eq!(records.len(), report.records_emitted);
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn sample_caption_dump(
    dump: &str,
    sentinel: &str,
    interval: i64,
) -> (Vec<TelemetryRecord>, ParseReport) {
    let events = CaptionEvents::with_classifier(dump, CaptionClassifier::new(sentinel));
    let mut sampler = IntervalSampler::new(events, interval);
    let records: Vec<TelemetryRecord> = sampler.by_ref().collect();
    (records, sampler.into_report())
}

/// List the videos in `dir` whose extension is in `extensions`.
///
/// Extensions are compared case-insensitively and without the leading dot.
/// Only regular files are returned, sorted by file name so runs are
/// reproducible.
///
/// # Errors
///
/// - [`TelemetryError::InvalidInputDirectory`] if `dir` is not a directory.
/// - [`TelemetryError::IoError`] if the listing cannot be read.
pub fn discover_videos<S: AsRef<str>>(
    dir: &Path,
    extensions: &[S],
) -> Result<Vec<PathBuf>, TelemetryError> {
    if !dir.is_dir() {
        return Err(TelemetryError::InvalidInputDirectory(dir.to_path_buf()));
    }

    let mut videos = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
            continue;
        };
        if extensions
            .iter()
            .any(|allowed| allowed.as_ref().eq_ignore_ascii_case(extension))
        {
            videos.push(path);
        } else {
            log::debug!("Skipping {}: not an accepted video format", path.display());
        }
    }

    videos.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(videos)
}

/// Write `value` as JSON with a one-space indent, creating parent
/// directories as needed.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), TelemetryError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    let mut serializer = Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b" "));
    value.serialize(&mut serializer)?;
    writer.flush()?;
    Ok(())
}

/// Read a JSON document previously written by [`write_json`].
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, TelemetryError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Result of exporting one video.
#[derive(Debug, Clone)]
pub struct VideoExport {
    /// The document that was written.
    pub metadata: VideoMetadata,
    /// Where it was written.
    pub output_path: PathBuf,
    /// Parse diagnostics for the video's caption dump.
    pub report: ParseReport,
}

/// Summary of a successfully exported video, kept in the batch report.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    /// The source video.
    pub video: PathBuf,
    /// Where its document was written.
    pub output_path: PathBuf,
    /// Parse diagnostics for the video's caption dump.
    pub report: ParseReport,
}

/// A video that could not be exported.
#[derive(Debug)]
pub struct VideoFailure {
    /// The source video.
    pub video: PathBuf,
    /// Why it failed.
    pub error: TelemetryError,
}

/// Outcome of a whole batch run.
#[derive(Debug)]
pub struct BatchReport {
    /// The batch document that was written.
    pub document: BatchDocument,
    /// Where the batch document was written.
    pub batch_path: PathBuf,
    /// Successfully exported videos, in discovery order.
    pub exported: Vec<ExportSummary>,
    /// Videos that failed, in discovery order.
    pub failures: Vec<VideoFailure>,
}

impl BatchReport {
    /// Number of videos that were attempted.
    pub fn attempted(&self) -> usize {
        self.exported.len() + self.failures.len()
    }

    /// Returns `true` if every discovered video was exported.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives a batch export over a directory of videos.
///
/// # Example
///
/// ```no_run
/// use djimeta::{BatchExporter, ExportOptions};
///
/// let options = ExportOptions::new()
///     .with_input_dir("dji_videos/")
///     .with_export_dir("src_vid_info/")
///     .with_interval(3);
/// let report = BatchExporter::with_ffmpeg(options).run()?;
/// println!(
///     "{} of {} videos exported to {}",
///     report.document.video_count(),
///     report.attempted(),
///     report.batch_path.display(),
/// );
/// # Ok::<(), djimeta::TelemetryError>(())
/// ```
#[derive(Clone)]
pub struct BatchExporter {
    options: ExportOptions,
    captions: Arc<dyn CaptionSource>,
    inspector: Arc<dyn VideoInspector>,
}

impl Debug for BatchExporter {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("BatchExporter")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl BatchExporter {
    /// Create an exporter with explicit collaborators.
    pub fn new<C, V>(options: ExportOptions, captions: C, inspector: V) -> Self
    where
        C: CaptionSource + 'static,
        V: VideoInspector + 'static,
    {
        Self {
            options,
            captions: Arc::new(captions),
            inspector: Arc::new(inspector),
        }
    }

    /// Create an exporter that uses `ffmpeg` and `ffprobe` from `PATH`.
    ///
    /// The caption extraction timeout is taken from `options`.
    pub fn with_ffmpeg(options: ExportOptions) -> Self {
        let captions = FfmpegCaptionSource::new().with_timeout(options.timeout());
        Self::new(options, captions, FfprobeInspector::new())
    }

    /// The options this exporter runs with.
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Videos the next run would process, in processing order.
    pub fn discover(&self) -> Result<Vec<PathBuf>, TelemetryError> {
        discover_videos(self.options.input_dir(), self.options.extensions())
    }

    /// Where the document for `video` is written.
    pub fn output_path_for(&self, video: &Path) -> PathBuf {
        let stem = video
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.options.export_dir().join(format!("{stem}.json"))
    }

    /// Export a single video: probe, dump captions, sample, write.
    ///
    /// # Errors
    ///
    /// Any collaborator or I/O failure for this video. The caller decides
    /// whether that ends the batch; [`run`](BatchExporter::run) records it
    /// and continues.
    pub fn export_video(&self, video: &Path) -> Result<VideoExport, TelemetryError> {
        log::debug!("Exporting telemetry for {}", video.display());

        let properties = self.inspector.inspect(video)?;
        let dump = self.captions.caption_dump(video)?;
        let (records, report) =
            sample_caption_dump(&dump, self.options.sentinel(), self.options.interval());

        if !report.is_clean() {
            log::warn!(
                "{}: {} telemetry line(s) rejected, {} record(s) before the first cue",
                video.display(),
                report.rejected_count(),
                report.records_without_time_mark,
            );
        }

        let metadata = VideoMetadata::aggregate(video.display().to_string(), properties, records);
        let output_path = self.output_path_for(video);
        write_json(&output_path, &metadata)?;

        log::info!(
            "{}: {} record(s) written to {}",
            video.display(),
            metadata.frame_info.len(),
            output_path.display()
        );

        Ok(VideoExport {
            metadata,
            output_path,
            report,
        })
    }

    /// Export every discovered video in order, then write the batch
    /// document.
    ///
    /// # Errors
    ///
    /// - [`TelemetryError::InvalidInputDirectory`] if the input directory is
    ///   unusable.
    /// - [`TelemetryError::Cancelled`] if the cancellation token fired; no
    ///   batch document is written.
    /// - Any I/O or serialization error writing the batch document.
    pub fn run(&self) -> Result<BatchReport, TelemetryError> {
        let videos = self.discover()?;
        log::info!(
            "Found {} video(s) in {}",
            videos.len(),
            self.options.input_dir().display()
        );

        let mut tracker = self.progress_tracker(videos.len());

        let mut outcomes = Vec::with_capacity(videos.len());
        for video in &videos {
            if self.options.is_cancelled() {
                return Err(TelemetryError::Cancelled);
            }
            outcomes.push(self.export_video(video));
            tracker.advance(Some(video.clone()));
        }
        tracker.finish();

        self.finish_batch(videos, outcomes)
    }

    /// Like [`run`](BatchExporter::run), but exports videos on the rayon
    /// thread pool. The batch document keeps discovery order.
    #[cfg(feature = "rayon")]
    pub fn run_parallel(&self) -> Result<BatchReport, TelemetryError> {
        let videos = self.discover()?;
        log::info!(
            "Found {} video(s) in {}, exporting in parallel",
            videos.len(),
            self.options.input_dir().display()
        );

        let outcomes = crate::rayon::parallel_export(self, &videos)?;
        self.finish_batch(videos, outcomes)
    }

    pub(crate) fn progress_tracker(&self, total: usize) -> ProgressTracker {
        ProgressTracker::new(
            self.options.progress.clone(),
            Some(total as u64),
            self.options.batch_size,
        )
    }

    fn finish_batch(
        &self,
        videos: Vec<PathBuf>,
        outcomes: Vec<Result<VideoExport, TelemetryError>>,
    ) -> Result<BatchReport, TelemetryError> {
        let mut document = BatchDocument::new();
        let mut exported = Vec::new();
        let mut failures = Vec::new();

        for (video, outcome) in videos.into_iter().zip(outcomes) {
            match outcome {
                Ok(export) => {
                    document.push(export.metadata);
                    exported.push(ExportSummary {
                        video,
                        output_path: export.output_path,
                        report: export.report,
                    });
                }
                Err(error) => {
                    log::warn!("Skipping {}: {error}", video.display());
                    failures.push(VideoFailure { video, error });
                }
            }
        }

        let batch_path = self.options.batch_path().to_path_buf();
        write_json(&batch_path, &document)?;
        log::info!(
            "Batch document with {} video(s) written to {}",
            document.video_count(),
            batch_path.display()
        );

        Ok(BatchReport {
            document,
            batch_path,
            exported,
            failures,
        })
    }
}

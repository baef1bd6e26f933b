//! # djimeta
//!
//! Extract DJI flight telemetry from video subtitle tracks.
//!
//! DJI drones write a telemetry line (aperture, shutter, GPS, distance from
//! home, altitude, speeds) into a caption track for every cue of the video.
//! `djimeta` dumps that track with FFmpeg, turns each line into a typed
//! [`TelemetryRecord`], thins the stream to one record per configured number
//! of cues, and writes one JSON document per video plus a batch document for
//! the whole directory.
//!
//! ## Quick Start
//!
//! ### Export a Directory
//!
//! ```no_run
//! use djimeta::{BatchExporter, ExportOptions};
//!
//! let options = ExportOptions::new()
//!     .with_input_dir("dji_videos/")
//!     .with_batch_path("data/data.json");
//! let report = BatchExporter::with_ffmpeg(options).run()?;
//! for failure in &report.failures {
//!     eprintln!("{}: {}", failure.video.display(), failure.error);
//! }
//! # Ok::<(), djimeta::TelemetryError>(())
//! ```
//!
//! ### Parse a Caption Dump
//!
//! ```
//! use djimeta::{CaptionEvents, IntervalSampler};
//!
//! let dump = "\
//! 00:00:03.000 --> 00:00:03.100
//! F/2.8, SS 320, ISO 100, EV 0, DZOOM 1.000, GPS (LATITUDE LONGITUDE 40.1234, -73.9876, ), D 24.35m, H 10.20m, H.S 2.30m/s, V.S 0.10m/s
//! ";
//! let records: Vec<_> = IntervalSampler::new(CaptionEvents::new(dump), 3).collect();
//! assert_eq!(records[0].second, "00:00:03.000 ");
//! assert_eq!(records[0].gps, vec!["40.1234", "-73.9876"]);
//! ```
//!
//! ## Features
//!
//! - **Caption classification**: cue timing lines, telemetry frame lines,
//!   everything else ignored
//! - **Bounds-checked positional parsing**: malformed lines are reported,
//!   never panic, and never abort a video
//! - **Interval sampling**: one record per N cues, lazily over the dump
//! - **Batch export**: per-video documents plus a batch document, with
//!   per-video failure isolation
//! - **Bounded subprocesses**: caption extraction is killed after a timeout
//! - **Progress & cancellation**: callbacks and a `CancellationToken`
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `native` | `NativeInspector` probes videos in-process via `ffmpeg-next` |
//! | `rayon` | `BatchExporter::run_parallel` exports videos concurrently |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! `ffmpeg` and `ffprobe` must be on `PATH` for the default collaborators.
//! The `native` feature additionally needs the FFmpeg development libraries.

pub mod caption;
pub mod configuration;
pub mod error;
pub mod exporter;
pub mod ffmpeg;
pub mod metadata;
pub mod probe;
pub mod progress;
#[cfg(feature = "rayon")]
mod rayon;
pub mod sampler;
pub mod telemetry;
pub mod validation;

pub use caption::{
    CUE_SEPARATOR, CaptionClassifier, CaptionEvent, CaptionEvents, CaptionLine,
    DEFAULT_FRAME_SENTINEL,
};
pub use configuration::{
    ALLOWED_EXTENSIONS, DEFAULT_BATCH_PATH, DEFAULT_EXPORT_DIR, DEFAULT_EXTRACTION_TIMEOUT,
    DEFAULT_INPUT_DIR, DEFAULT_INTERVAL, ExportOptions,
};
pub use error::{ParseError, TelemetryError};
pub use exporter::{
    BatchExporter, BatchReport, ExportSummary, VideoExport, VideoFailure, discover_videos,
    read_json, sample_caption_dump, write_json,
};
pub use ffmpeg::{CaptionSource, FfmpegCaptionSource};
pub use metadata::{BatchDocument, VideoMetadata, VideoProperties};
#[cfg(feature = "native")]
pub use probe::NativeInspector;
pub use probe::{FfprobeInspector, VideoInspector};
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo};
pub use sampler::{IntervalSampler, RecordGroups, SamplerState};
pub use telemetry::{TelemetryParser, TelemetryRecord};
pub use validation::{ParseReport, RejectedLine};

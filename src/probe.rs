//! Video duration and resolution probing.
//!
//! [`VideoInspector`] is the seam the exporter uses to learn a video's
//! duration and frame size. [`FfprobeInspector`] shells out to `ffprobe`
//! and reads its JSON report. With the `native` feature,
//! [`NativeInspector`] opens the container in-process through
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) instead.
//!
//! # Example
//!
//! ```no_run
//! use djimeta::{FfprobeInspector, VideoInspector};
//!
//! let properties = FfprobeInspector::new().inspect("DJI_0001.MP4".as_ref())?;
//! println!("{:.1}s at {}x{}", properties.duration, properties.width, properties.height);
//! # Ok::<(), djimeta::TelemetryError>(())
//! ```

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use serde_json::Value;

use crate::error::TelemetryError;
use crate::ffmpeg::{RunError, run_with_timeout};
use crate::metadata::VideoProperties;

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Supplies duration and resolution of a video.
pub trait VideoInspector: Send + Sync {
    /// Inspect `video`.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::ProbeFailed`] if the file cannot be read or
    /// has no video stream.
    fn inspect(&self, video: &Path) -> Result<VideoProperties, TelemetryError>;
}

/// [`VideoInspector`] backed by the `ffprobe` command-line tool.
#[derive(Debug, Clone)]
pub struct FfprobeInspector {
    program: PathBuf,
}

impl Default for FfprobeInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl FfprobeInspector {
    /// Use `ffprobe` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ffprobe"),
        }
    }

    /// Use a specific `ffprobe` executable.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }
}

impl VideoInspector for FfprobeInspector {
    fn inspect(&self, video: &Path) -> Result<VideoProperties, TelemetryError> {
        let failed = |reason: String| TelemetryError::ProbeFailed {
            path: video.to_path_buf(),
            reason,
        };

        let mut command = Command::new(&self.program);
        command
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(video)
            .stdin(Stdio::null());

        let output = run_with_timeout(command, PROBE_TIMEOUT).map_err(|error| match error {
            RunError::TimedOut => failed(format!("ffprobe timed out after {PROBE_TIMEOUT:?}")),
            RunError::Io(error) => failed(format!("failed to run ffprobe: {error}")),
        })?;

        if !output.status.success() {
            return Err(failed(format!("ffprobe exited with {}", output.status)));
        }

        let report: Value = serde_json::from_slice(&output.stdout)
            .map_err(|error| failed(format!("unreadable ffprobe report: {error}")))?;
        properties_from_report(&report).map_err(failed)
    }
}

/// Pull duration and frame size out of an `ffprobe` JSON report.
fn properties_from_report(report: &Value) -> Result<VideoProperties, String> {
    let stream = report["streams"]
        .as_array()
        .and_then(|streams| streams.first())
        .ok_or_else(|| "no video stream found".to_string())?;

    let dimension = |key: &str| {
        stream[key]
            .as_u64()
            .and_then(|value| u32::try_from(value).ok())
            .ok_or_else(|| format!("video stream has no usable {key}"))
    };

    // Container duration first; some muxers only fill in the stream's.
    let duration = [&report["format"]["duration"], &stream["duration"]]
        .into_iter()
        .find_map(|value| value.as_str().and_then(|text| text.parse::<f64>().ok()))
        .unwrap_or(0.0);

    Ok(VideoProperties {
        duration,
        width: dimension("width")?,
        height: dimension("height")?,
    })
}

/// [`VideoInspector`] that opens the container through libav.
#[cfg(feature = "native")]
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeInspector;

#[cfg(feature = "native")]
impl NativeInspector {
    /// Create an inspector, initialising FFmpeg (idempotent).
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "native")]
impl VideoInspector for NativeInspector {
    fn inspect(&self, video: &Path) -> Result<VideoProperties, TelemetryError> {
        use ffmpeg_next::{codec::context::Context as CodecContext, media::Type};

        let failed = |reason: String| TelemetryError::ProbeFailed {
            path: video.to_path_buf(),
            reason,
        };

        ffmpeg_next::init().map_err(|error| failed(format!("FFmpeg initialisation failed: {error}")))?;
        let input = ffmpeg_next::format::input(&video).map_err(|error| failed(error.to_string()))?;

        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or_else(|| failed("no video stream found".to_string()))?;
        let decoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|error| failed(error.to_string()))?;

        let duration = if input.duration() > 0 {
            input.duration() as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE)
        } else {
            0.0
        };

        Ok(VideoProperties {
            duration,
            width: decoder.width(),
            height: decoder.height(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn report_with_format_duration() {
        let report = json!({
            "streams": [{ "width": 3840, "height": 2160, "codec_name": "hevc" }],
            "format": { "duration": "62.062000" }
        });
        let properties = properties_from_report(&report).unwrap();
        assert_eq!(properties.width, 3840);
        assert_eq!(properties.height, 2160);
        assert!((properties.duration - 62.062).abs() < 1e-9);
    }

    #[test]
    fn report_falls_back_to_stream_duration() {
        let report = json!({
            "streams": [{ "width": 1920, "height": 1080, "duration": "10.5" }],
            "format": {}
        });
        assert!((properties_from_report(&report).unwrap().duration - 10.5).abs() < 1e-9);
    }

    #[test]
    fn report_without_streams_is_rejected() {
        let report = json!({ "streams": [], "format": { "duration": "1.0" } });
        assert!(properties_from_report(&report).is_err());
    }
}

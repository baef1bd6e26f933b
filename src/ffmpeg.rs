//! Caption track extraction through the `ffmpeg` executable.
//!
//! [`CaptionSource`] is the seam between the exporter and whatever produces
//! a video's caption dump. [`FfmpegCaptionSource`] runs
//!
//! ```text
//! ffmpeg -i <video> -map s:0 -f webvtt -
//! ```
//!
//! and returns its standard output. The subprocess is bounded by a timeout:
//! stdout and stderr are drained on helper threads while the child is polled,
//! and the child is killed once the limit passes.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use djimeta::{CaptionSource, FfmpegCaptionSource};
//!
//! let source = FfmpegCaptionSource::new().with_timeout(Duration::from_secs(30));
//! let dump = source.caption_dump("dji_videos/DJI_0001.MP4".as_ref())?;
//! println!("{} caption lines", dump.lines().count());
//! # Ok::<(), djimeta::TelemetryError>(())
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::configuration::DEFAULT_EXTRACTION_TIMEOUT;
use crate::error::TelemetryError;

const POLL_INTERVAL: Duration = Duration::from_millis(25);
const STDERR_EXCERPT: usize = 400;

/// Supplies the raw caption dump of a video.
///
/// Implementations must be [`Send`] and [`Sync`] so a batch can fan out over
/// worker threads.
pub trait CaptionSource: Send + Sync {
    /// Return the first subtitle stream of `video` as WebVTT text.
    ///
    /// # Errors
    ///
    /// - [`TelemetryError::ExtractionFailed`] if no usable dump was produced.
    /// - [`TelemetryError::ExtractionTimedOut`] if the extraction ran too long.
    fn caption_dump(&self, video: &Path) -> Result<String, TelemetryError>;
}

/// [`CaptionSource`] backed by the `ffmpeg` command-line tool.
#[derive(Debug, Clone)]
pub struct FfmpegCaptionSource {
    program: PathBuf,
    timeout: Duration,
}

impl Default for FfmpegCaptionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegCaptionSource {
    /// Use `ffmpeg` from `PATH` with the default timeout.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            timeout: DEFAULT_EXTRACTION_TIMEOUT,
        }
    }

    /// Use a specific `ffmpeg` executable.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Set the limit for one extraction.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl CaptionSource for FfmpegCaptionSource {
    fn caption_dump(&self, video: &Path) -> Result<String, TelemetryError> {
        log::debug!(
            "Dumping caption track of {} with {}",
            video.display(),
            self.program.display()
        );

        let mut command = Command::new(&self.program);
        command
            .arg("-i")
            .arg(video)
            .args(["-map", "s:0", "-f", "webvtt", "-"])
            .stdin(Stdio::null());

        let output = run_with_timeout(command, self.timeout).map_err(|error| match error {
            RunError::TimedOut => TelemetryError::ExtractionTimedOut {
                path: video.to_path_buf(),
                timeout: self.timeout,
            },
            RunError::Io(error) => TelemetryError::ExtractionFailed {
                path: video.to_path_buf(),
                reason: format!("failed to run {}: {error}", self.program.display()),
            },
        })?;

        if !output.status.success() {
            return Err(TelemetryError::ExtractionFailed {
                path: video.to_path_buf(),
                reason: format!("{} ({})", output.status, excerpt(&output.stderr)),
            });
        }

        let dump = String::from_utf8_lossy(&output.stdout).into_owned();
        if dump.trim().is_empty() {
            return Err(TelemetryError::ExtractionFailed {
                path: video.to_path_buf(),
                reason: "caption stream is empty".to_string(),
            });
        }

        Ok(dump)
    }
}

/// Captured result of a finished subprocess.
#[derive(Debug)]
pub(crate) struct CapturedOutput {
    pub(crate) status: ExitStatus,
    pub(crate) stdout: Vec<u8>,
    pub(crate) stderr: Vec<u8>,
}

#[derive(Debug)]
pub(crate) enum RunError {
    TimedOut,
    Io(std::io::Error),
}

impl From<std::io::Error> for RunError {
    fn from(error: std::io::Error) -> Self {
        RunError::Io(error)
    }
}

/// Spawn `command` with piped output and wait at most `timeout` for it.
pub(crate) fn run_with_timeout(
    mut command: Command,
    timeout: Duration,
) -> Result<CapturedOutput, RunError> {
    let mut child = command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    // A limit too large to represent as an instant means no deadline.
    let deadline = Instant::now().checked_add(timeout);
    let status = match wait_until(&mut child, deadline) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(RunError::TimedOut);
        }
        Err(error) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(error.into());
        }
    };

    Ok(CapturedOutput {
        status,
        stdout: collect(stdout)?,
        stderr: collect(stderr)?,
    })
}

fn wait_until(
    child: &mut Child,
    deadline: Option<Instant>,
) -> std::io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn drain<R>(pipe: Option<R>) -> Option<JoinHandle<std::io::Result<Vec<u8>>>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            pipe.read_to_end(&mut buffer)?;
            Ok(buffer)
        })
    })
}

fn collect(
    handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
) -> Result<Vec<u8>, RunError> {
    match handle {
        Some(handle) => match handle.join() {
            Ok(result) => Ok(result?),
            Err(_) => Err(RunError::Io(std::io::Error::other("output reader panicked"))),
        },
        None => Ok(Vec::new()),
    }
}

/// Last few hundred characters of stderr, where ffmpeg puts the reason.
fn excerpt(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    let start = trimmed
        .char_indices()
        .rev()
        .nth(STDERR_EXCERPT)
        .map_or(0, |(index, _)| index);
    trimmed[start..].to_string()
}

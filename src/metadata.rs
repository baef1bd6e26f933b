//! Per-video and batch documents.
//!
//! [`VideoMetadata`] is the document written for each video and
//! [`BatchDocument`] collects every successfully processed video of a run.
//! Both serialize to the JSON layout downstream consumers already read,
//! including the `"vid_count:"` key with its trailing colon.
//!
//! # Example
//!
//! ```
//! use djimeta::{BatchDocument, VideoMetadata, VideoProperties};
//!
//! let properties = VideoProperties { duration: 12.5, width: 3840, height: 2160 };
//! let video = VideoMetadata::aggregate("dji_videos/DJI_0001.MP4", properties, Vec::new());
//!
//! let mut batch = BatchDocument::new();
//! batch.push(video);
//! assert_eq!(batch.video_count(), 1);
//!
//! let json = serde_json::to_value(&batch)?;
//! assert_eq!(json["vid_count:"], 1);
//! # Ok::<(), serde_json::Error>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::telemetry::TelemetryRecord;

/// Container-level facts about a video, supplied by a
/// [`VideoInspector`](crate::VideoInspector).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoProperties {
    /// Duration in seconds.
    pub duration: f64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

/// The telemetry document for one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Path of the source video as it was discovered.
    pub filename: String,
    /// Duration in seconds.
    pub duration: f64,
    /// `(width, height)` in pixels, serialized as a two-element array.
    pub resolution: (u32, u32),
    /// Sampled telemetry records in caption order.
    pub frame_info: Vec<TelemetryRecord>,
}

impl VideoMetadata {
    /// Combine a video's identity, properties and sampled records.
    pub fn aggregate(
        filename: impl Into<String>,
        properties: VideoProperties,
        frame_info: Vec<TelemetryRecord>,
    ) -> Self {
        Self {
            filename: filename.into(),
            duration: properties.duration,
            resolution: (properties.width, properties.height),
            frame_info,
        }
    }
}

/// Every successfully processed video of a run, in discovery order.
///
/// The serialized count is derived from the list, so it can never disagree
/// with it. Failed videos appear in neither.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "BatchWire", try_from = "BatchWire")]
pub struct BatchDocument {
    videos: Vec<VideoMetadata>,
}

impl BatchDocument {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finished video document.
    pub fn push(&mut self, video: VideoMetadata) {
        self.videos.push(video);
    }

    /// Number of videos in the batch.
    pub fn video_count(&self) -> usize {
        self.videos.len()
    }

    /// The videos, in the order they were appended.
    pub fn videos(&self) -> &[VideoMetadata] {
        &self.videos
    }

    /// Consume the batch and return its videos.
    pub fn into_videos(self) -> Vec<VideoMetadata> {
        self.videos
    }
}

impl FromIterator<VideoMetadata> for BatchDocument {
    fn from_iter<T: IntoIterator<Item = VideoMetadata>>(iter: T) -> Self {
        Self {
            videos: iter.into_iter().collect(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct BatchWire {
    #[serde(rename = "vid_count:")]
    video_count: usize,
    #[serde(rename = "Videos")]
    videos: Vec<VideoMetadata>,
}

impl From<BatchDocument> for BatchWire {
    fn from(batch: BatchDocument) -> Self {
        Self {
            video_count: batch.videos.len(),
            videos: batch.videos,
        }
    }
}

impl TryFrom<BatchWire> for BatchDocument {
    type Error = String;

    fn try_from(wire: BatchWire) -> Result<Self, Self::Error> {
        if wire.video_count != wire.videos.len() {
            return Err(format!(
                "vid_count: is {} but Videos holds {} entries",
                wire.video_count,
                wire.videos.len()
            ));
        }
        Ok(Self {
            videos: wire.videos,
        })
    }
}

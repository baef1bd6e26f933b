//! Caption dump classification.
//!
//! A DJI caption track dumped as WebVTT interleaves cue timing lines with
//! telemetry frame lines:
//!
//! ```text
//! WEBVTT
//!
//! 00:00:00.000 --> 00:00:00.033
//! F/2.8, SS 320, ISO 100, EV 0, DZOOM 1.000, GPS (...), D 0.00m, H 0.00m, H.S 0.00m/s, V.S 0.00m/s
//! ```
//!
//! [`CaptionClassifier`] decides what a single line is. [`CaptionEvents`]
//! folds a whole dump into a lazy stream of [`CaptionEvent`]s, carrying the
//! most recent time mark so every parsed record knows which cue it belongs
//! to.
//!
//! # Example
//!
//! ```
//! use djimeta::{CaptionEvent, CaptionEvents};
//!
//! let dump = "WEBVTT\n\n00:00:03.000 --> 00:00:03.100\nhello\n";
//! let events: Vec<CaptionEvent> = CaptionEvents::new(dump).collect();
//! assert_eq!(events, vec![CaptionEvent::TimeMark("00:00:03.000 ".to_string())]);
//! ```

use crate::error::ParseError;
use crate::telemetry::{TelemetryParser, TelemetryRecord};

/// Separator between cue start and end on a timing line.
pub const CUE_SEPARATOR: &str = "-->";

/// Token that marks a DJI frame metadata line (the aperture field).
pub const DEFAULT_FRAME_SENTINEL: &str = "F/";

/// What a single caption line carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionLine<'a> {
    /// A cue timing line; holds everything before the cue separator,
    /// whitespace included.
    TimeMarker(&'a str),
    /// A DJI frame metadata line, untouched.
    TelemetryData(&'a str),
    /// Anything else: blank lines, cue indices, headers, ordinary captions.
    Ignorable,
}

/// Line classifier keyed on the cue separator and a frame sentinel.
#[derive(Debug, Clone)]
pub struct CaptionClassifier {
    sentinel: String,
}

impl Default for CaptionClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_SENTINEL)
    }
}

impl CaptionClassifier {
    /// Create a classifier that recognises frame lines by `sentinel`.
    pub fn new(sentinel: impl Into<String>) -> Self {
        Self {
            sentinel: sentinel.into(),
        }
    }

    /// The sentinel this classifier matches.
    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    /// Classify one line. Timing lines win over frame lines.
    ///
    /// The marker text is kept verbatim, so `"00:00:03.000 --> ..."` yields
    /// `"00:00:03.000 "` with its trailing space. Existing consumers of the
    /// exported documents read `second` in that form.
    pub fn classify<'a>(&self, line: &'a str) -> CaptionLine<'a> {
        if let Some((start, _)) = line.split_once(CUE_SEPARATOR) {
            return CaptionLine::TimeMarker(start);
        }
        if !self.sentinel.is_empty() && line.contains(self.sentinel.as_str()) {
            return CaptionLine::TelemetryData(line);
        }
        CaptionLine::Ignorable
    }
}

/// One meaningful step of a caption dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptionEvent {
    /// A new timestamp-group starts.
    TimeMark(String),
    /// A telemetry line parsed into a record.
    Record(TelemetryRecord),
    /// A telemetry line that failed to parse.
    Rejected {
        /// 1-based line number within the dump.
        line_number: usize,
        /// Why the line was rejected.
        error: ParseError,
    },
}

/// Lazy event stream over a caption dump.
///
/// Single pass: the iterator borrows the dump and carries the current time
/// mark as explicit state. Malformed telemetry lines surface as
/// [`CaptionEvent::Rejected`] and never end the stream.
#[derive(Debug)]
pub struct CaptionEvents<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    classifier: CaptionClassifier,
    parser: TelemetryParser,
    current_mark: Option<String>,
}

impl<'a> CaptionEvents<'a> {
    /// Stream events from `dump` using the default frame sentinel.
    pub fn new(dump: &'a str) -> Self {
        Self::with_classifier(dump, CaptionClassifier::default())
    }

    /// Stream events from `dump` using a custom classifier.
    pub fn with_classifier(dump: &'a str, classifier: CaptionClassifier) -> Self {
        Self {
            lines: dump.lines().enumerate(),
            classifier,
            parser: TelemetryParser::new(),
            current_mark: None,
        }
    }

    /// The most recent time mark seen so far.
    pub fn current_mark(&self) -> Option<&str> {
        self.current_mark.as_deref()
    }
}

impl Iterator for CaptionEvents<'_> {
    type Item = CaptionEvent;

    fn next(&mut self) -> Option<Self::Item> {
        for (index, line) in self.lines.by_ref() {
            match self.classifier.classify(line) {
                CaptionLine::TimeMarker(mark) => {
                    self.current_mark = Some(mark.to_string());
                    return Some(CaptionEvent::TimeMark(mark.to_string()));
                }
                CaptionLine::TelemetryData(data) => {
                    let event = match self.parser.parse(data, self.current_mark.as_deref()) {
                        Ok(record) => CaptionEvent::Record(record),
                        Err(error) => {
                            log::debug!("Rejected telemetry line {}: {error}", index + 1);
                            CaptionEvent::Rejected {
                                line_number: index + 1,
                                error,
                            }
                        }
                    };
                    return Some(event);
                }
                CaptionLine::Ignorable => {}
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_cue_line_keeps_raw_prefix() {
        let classifier = CaptionClassifier::default();
        assert_eq!(
            classifier.classify("00:00:03.000 --> 00:00:03.100"),
            CaptionLine::TimeMarker("00:00:03.000 ")
        );
        assert_eq!(
            classifier.classify("00:00:03.000-->00:00:03.100"),
            CaptionLine::TimeMarker("00:00:03.000")
        );
    }

    #[test]
    fn classify_ignores_plain_lines() {
        let classifier = CaptionClassifier::default();
        for line in ["", "WEBVTT", "42", "Hello there"] {
            assert_eq!(classifier.classify(line), CaptionLine::Ignorable, "{line:?}");
        }
    }

    #[test]
    fn empty_sentinel_matches_nothing() {
        let classifier = CaptionClassifier::new("");
        assert_eq!(classifier.classify("F/2.8, SS 320"), CaptionLine::Ignorable);
    }
}

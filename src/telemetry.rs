//! Telemetry record parsing.
//!
//! DJI firmware writes one comma-separated frame line per caption cue, e.g.
//!
//! ```text
//! F/2.8, SS 320, ISO 100, EV 0, DZOOM 1.000, GPS (LATITUDE LONGITUDE 40.1234, -73.9876, ), D 24.35m, H 10.20m, H.S 2.30m/s, V.S 0.10m/s
//! ```
//!
//! Fields are located by segment position. The positions are collected in
//! the private `layout` constants below and every access is bounds-checked,
//! so a short or truncated line yields [`ParseError::MalformedLine`] rather
//! than a panic.
//!
//! # Example
//!
//! ```
//! use djimeta::TelemetryParser;
//!
//! let line = "F/2.8, SS 320, ISO 100, EV 0, DZOOM 1.000, \
//!             GPS (LATITUDE LONGITUDE 40.1234, -73.9876, ), \
//!             D 24.35m, H 10.20m, H.S 2.30m/s, V.S 0.10m/s";
//! let record = TelemetryParser::new().parse(line, Some("00:00:03.000"))?;
//! assert_eq!(record.gps, vec!["40.1234", "-73.9876"]);
//! assert_eq!(record.altitude, "10.20m");
//! # Ok::<(), djimeta::ParseError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Segment positions (0-indexed) of each field in a frame line.
mod layout {
    use std::ops::Range;

    pub(super) const GPS: Range<usize> = 5..8;
    pub(super) const DISTANCE: usize = 8;
    pub(super) const ALTITUDE: usize = 9;
    pub(super) const HORIZONTAL_SPEED: usize = 10;
    pub(super) const VERTICAL_SPEED: usize = 11;

    /// Segments a line must have for every index above to resolve.
    pub(super) const MIN_SEGMENTS: usize = 12;

    /// Labelled values (`" H 10.20m"`) keep their value in this token after
    /// splitting on single spaces.
    pub(super) const LABELLED_VALUE_TOKEN: usize = 2;

    /// Leading tokens of the GPS text that precede the coordinates.
    pub(super) const GPS_LABEL_TOKENS: usize = 2;
}

/// One telemetry sample as written to the per-video JSON document.
///
/// Key names and order are part of the output contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    /// Start of the caption cue this line belongs to.
    pub second: String,
    /// Height above the take-off point, unit suffix included.
    pub altitude: String,
    /// Coordinate components in the order the firmware writes them.
    pub gps: Vec<String>,
    /// Distance from the home point, unit suffix included.
    #[serde(rename = "dst_from_HQ")]
    pub distance_from_home: String,
    /// Horizontal speed segment.
    #[serde(rename = "hs")]
    pub horizontal_speed: String,
    /// Vertical speed segment.
    #[serde(rename = "vs")]
    pub vertical_speed: String,
}

/// Positional parser for DJI frame lines.
///
/// Stateless; the current time mark is supplied by the caller on every
/// call (see [`CaptionEvents`](crate::CaptionEvents)).
#[derive(Debug, Clone, Copy, Default)]
pub struct TelemetryParser;

impl TelemetryParser {
    /// Create a parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse one telemetry line into a record.
    ///
    /// `current_time_mark` is the most recent cue start seen before the
    /// line. When it is `None` the record is still produced with an empty
    /// `second` and a warning is logged.
    ///
    /// # Errors
    ///
    /// - [`ParseError::MalformedLine`] if the line has fewer segments than
    ///   the layout requires.
    /// - [`ParseError::EmptyField`] if any field strips down to nothing.
    pub fn parse(
        &self,
        line: &str,
        current_time_mark: Option<&str>,
    ) -> Result<TelemetryRecord, ParseError> {
        let segments = Segments::split(line);
        segments.require(layout::MIN_SEGMENTS)?;

        let gps = gps_components(&segments.concat(layout::GPS)?);
        if gps.is_empty() {
            return Err(ParseError::EmptyField { field: "gps" });
        }

        let distance_from_home =
            labelled_value(segments.get(layout::DISTANCE)?).ok_or(ParseError::EmptyField {
                field: "dst_from_HQ",
            })?;
        let altitude = labelled_value(segments.get(layout::ALTITUDE)?)
            .ok_or(ParseError::EmptyField { field: "altitude" })?;
        let horizontal_speed = non_empty(segments.get(layout::HORIZONTAL_SPEED)?, "hs")?;
        let vertical_speed = non_empty(segments.get(layout::VERTICAL_SPEED)?, "vs")?;

        let second = match current_time_mark {
            Some(mark) => mark.to_string(),
            None => {
                log::warn!("Telemetry line precedes any caption cue; leaving `second` empty");
                String::new()
            }
        };

        Ok(TelemetryRecord {
            second,
            altitude,
            gps,
            distance_from_home,
            horizontal_speed,
            vertical_speed,
        })
    }
}

/// Comma-separated segments of a frame line with checked access.
struct Segments<'a> {
    parts: Vec<&'a str>,
}

impl<'a> Segments<'a> {
    fn split(line: &'a str) -> Self {
        Self {
            parts: line.split(',').collect(),
        }
    }

    fn require(&self, required: usize) -> Result<(), ParseError> {
        if self.parts.len() < required {
            return Err(self.malformed(required));
        }
        Ok(())
    }

    fn get(&self, index: usize) -> Result<&'a str, ParseError> {
        self.parts
            .get(index)
            .copied()
            .ok_or_else(|| self.malformed(index + 1))
    }

    fn concat(&self, range: std::ops::Range<usize>) -> Result<String, ParseError> {
        let end = range.end;
        self.parts
            .get(range)
            .map(|parts| parts.concat())
            .ok_or_else(|| self.malformed(end))
    }

    fn malformed(&self, required: usize) -> ParseError {
        ParseError::MalformedLine {
            required,
            found: self.parts.len(),
        }
    }
}

/// Strip the `GPS` label and parentheses, then drop the label tokens.
fn gps_components(text: &str) -> Vec<String> {
    let stripped = text.replace("GPS", "").replace(['(', ')'], "");
    stripped
        .split_whitespace()
        .skip(layout::GPS_LABEL_TOKENS)
        .map(str::to_string)
        .collect()
}

/// Third single-space token of a `" <label> <value>"` segment.
fn labelled_value(segment: &str) -> Option<String> {
    segment
        .split(' ')
        .nth(layout::LABELLED_VALUE_TOKEN)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn non_empty(segment: &str, field: &'static str) -> Result<String, ParseError> {
    let trimmed = segment.trim();
    if trimmed.is_empty() {
        return Err(ParseError::EmptyField { field });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labelled_value_skips_leading_space_token() {
        assert_eq!(labelled_value(" H 10.20m").as_deref(), Some("10.20m"));
        assert_eq!(labelled_value(" D 0.00m").as_deref(), Some("0.00m"));
        assert_eq!(labelled_value(" H"), None);
        assert_eq!(labelled_value(" H  "), None);
    }

    #[test]
    fn gps_components_drop_label_tokens() {
        assert_eq!(
            gps_components(" GPS (LATITUDE LONGITUDE 40.1234 -73.9876 )"),
            vec!["40.1234", "-73.9876"]
        );
        assert!(gps_components(" GPS (LATITUDE LONGITUDE)").is_empty());
    }

    #[test]
    fn segment_access_is_bounds_checked() {
        let segments = Segments::split("a,b");
        assert_eq!(segments.get(1), Ok("b"));
        assert_eq!(
            segments.get(5),
            Err(ParseError::MalformedLine {
                required: 6,
                found: 2
            })
        );
        assert!(segments.concat(1..4).is_err());
    }
}

//! Per-video parse diagnostics.
//!
//! [`ParseReport`] is filled in by [`IntervalSampler`](crate::IntervalSampler)
//! while a caption dump is consumed. It records how many cues and telemetry
//! lines were seen and which lines were rejected, so a batch can report bad
//! lines without aborting.
//!
//! # Example
//!
//! ```
//! use djimeta::{CaptionEvents, IntervalSampler};
//!
//! let dump = "00:00:00.000 --> 00:00:00.033\nF/2.8, SS 320\n";
//! let mut sampler = IntervalSampler::new(CaptionEvents::new(dump), 1);
//! assert_eq!(sampler.by_ref().count(), 0);
//! let report = sampler.into_report();
//! assert!(!report.is_clean());
//! print!("{report}");
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::ParseError;

/// A telemetry line that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    /// 1-based line number within the caption dump.
    pub line_number: usize,
    /// Why the line was rejected.
    pub error: ParseError,
}

/// Counters and rejections collected while sampling one caption dump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    /// Cue timing lines seen (timestamp-groups).
    pub time_marks: usize,
    /// Lines recognised as telemetry, parsed or not.
    pub telemetry_lines: usize,
    /// Telemetry lines that produced a record.
    pub records_parsed: usize,
    /// Records that survived interval sampling.
    pub records_emitted: usize,
    /// Records parsed before any cue timing line.
    pub records_without_time_mark: usize,
    /// Telemetry lines that failed to parse.
    pub rejected: Vec<RejectedLine>,
}

impl ParseReport {
    /// Returns `true` if every telemetry line parsed and had a time mark.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.records_without_time_mark == 0
    }

    /// Number of rejected telemetry lines.
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

impl Display for ParseReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(
            f,
            "[INFO] {} cue(s), {} telemetry line(s), {} parsed, {} kept",
            self.time_marks, self.telemetry_lines, self.records_parsed, self.records_emitted,
        )?;
        if self.records_without_time_mark > 0 {
            writeln!(
                f,
                "[WARN] {} record(s) precede the first cue",
                self.records_without_time_mark,
            )?;
        }
        for rejected in &self.rejected {
            writeln!(f, "[WARN] line {}: {}", rejected.line_number, rejected.error)?;
        }
        Ok(())
    }
}

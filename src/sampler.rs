//! Interval thinning of telemetry records.
//!
//! DJI cameras emit a telemetry line for every caption cue, which is far
//! denser than most consumers need. [`IntervalSampler`] keeps one record and
//! then skips until `interval` timestamp-groups have gone by.
//!
//! The countdown is driven by cue count, not elapsed seconds: a cue every
//! 33 ms with `interval = 3` keeps one record per three cues. This is the
//! established output of the tool and is kept as is.
//!
//! # Example
//!
//! ```
//! use djimeta::{CaptionEvents, IntervalSampler};
//!
//! let dump = std::fs::read_to_string("tests/fixtures/dji_flight.vtt")?;
//! let mut sampler = IntervalSampler::new(CaptionEvents::new(&dump), 3);
//! let records: Vec<_> = sampler.by_ref().collect();
//! let report = sampler.into_report();
//! assert_eq!(records.len(), report.records_emitted);
//! # Ok::<(), std::io::Error>(())
//! ```

use crate::caption::CaptionEvent;
use crate::telemetry::TelemetryRecord;
use crate::validation::{ParseReport, RejectedLine};

/// Countdown state shared by every sampling entry point.
///
/// Starts at zero so the first record is always kept. A non-positive
/// interval never lifts the countdown above zero, so every record is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerState {
    countdown: i64,
    interval: i64,
}

impl SamplerState {
    /// Fresh state for the given interval.
    pub fn new(interval: i64) -> Self {
        Self {
            countdown: 0,
            interval,
        }
    }

    /// The configured interval.
    pub fn interval(&self) -> i64 {
        self.interval
    }

    /// Register the start of a new timestamp-group.
    pub fn on_time_mark(&mut self) {
        self.countdown = self.countdown.saturating_sub(1);
    }

    /// Keep `record` if the countdown has run out, re-arming it.
    pub fn admit(&mut self, record: TelemetryRecord) -> Option<TelemetryRecord> {
        if self.countdown <= 0 {
            self.countdown = self.interval;
            Some(record)
        } else {
            None
        }
    }
}

/// Lazy sampler over a caption event stream.
///
/// Single pass and not restartable. Parse diagnostics are accumulated as the
/// stream is consumed; drive the sampler with [`Iterator::by_ref`] to read
/// them afterwards through [`IntervalSampler::into_report`].
#[derive(Debug)]
pub struct IntervalSampler<I> {
    events: I,
    state: SamplerState,
    report: ParseReport,
}

impl<I> IntervalSampler<I>
where
    I: Iterator<Item = CaptionEvent>,
{
    /// Sample `events`, keeping one record per `interval` timestamp-groups.
    pub fn new(events: I, interval: i64) -> Self {
        Self {
            events,
            state: SamplerState::new(interval),
            report: ParseReport::default(),
        }
    }

    /// Diagnostics gathered so far.
    pub fn report(&self) -> &ParseReport {
        &self.report
    }

    /// Consume the sampler and return its diagnostics.
    pub fn into_report(self) -> ParseReport {
        self.report
    }
}

impl<R> IntervalSampler<RecordGroups<R>>
where
    R: Iterator<Item = TelemetryRecord>,
{
    /// Sample a plain record sequence.
    ///
    /// A change of [`TelemetryRecord::second`] between consecutive records
    /// starts a new timestamp-group.
    pub fn over_records<T>(records: T, interval: i64) -> Self
    where
        T: IntoIterator<IntoIter = R>,
    {
        Self::new(RecordGroups::new(records.into_iter()), interval)
    }
}

impl<I> Iterator for IntervalSampler<I>
where
    I: Iterator<Item = CaptionEvent>,
{
    type Item = TelemetryRecord;

    fn next(&mut self) -> Option<Self::Item> {
        for event in self.events.by_ref() {
            match event {
                CaptionEvent::TimeMark(_) => {
                    self.report.time_marks += 1;
                    self.state.on_time_mark();
                }
                CaptionEvent::Record(record) => {
                    self.report.telemetry_lines += 1;
                    self.report.records_parsed += 1;
                    if record.second.is_empty() {
                        self.report.records_without_time_mark += 1;
                    }
                    if let Some(kept) = self.state.admit(record) {
                        self.report.records_emitted += 1;
                        return Some(kept);
                    }
                }
                CaptionEvent::Rejected { line_number, error } => {
                    self.report.telemetry_lines += 1;
                    self.report.rejected.push(RejectedLine { line_number, error });
                }
            }
        }
        None
    }
}

/// Adapter that turns records into events, inserting a time mark whenever
/// `second` changes.
#[derive(Debug)]
pub struct RecordGroups<R> {
    records: R,
    pending: Option<TelemetryRecord>,
    last_second: Option<String>,
}

impl<R> RecordGroups<R> {
    fn new(records: R) -> Self {
        Self {
            records,
            pending: None,
            last_second: None,
        }
    }
}

impl<R> Iterator for RecordGroups<R>
where
    R: Iterator<Item = TelemetryRecord>,
{
    type Item = CaptionEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(record) = self.pending.take() {
            return Some(CaptionEvent::Record(record));
        }

        let record = self.records.next()?;
        if self.last_second.as_deref() == Some(record.second.as_str()) {
            return Some(CaptionEvent::Record(record));
        }

        let mark = record.second.clone();
        self.last_second = Some(mark.clone());
        self.pending = Some(record);
        Some(CaptionEvent::TimeMark(mark))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(second: &str) -> TelemetryRecord {
        TelemetryRecord {
            second: second.to_string(),
            altitude: "1.0m".to_string(),
            gps: vec!["1".to_string(), "2".to_string()],
            distance_from_home: "0.0m".to_string(),
            horizontal_speed: "H.S 0.00m/s".to_string(),
            vertical_speed: "V.S 0.00m/s".to_string(),
        }
    }

    #[test]
    fn state_keeps_first_record() {
        let mut state = SamplerState::new(3);
        assert!(state.admit(record("a")).is_some());
        assert!(state.admit(record("a")).is_none());
    }

    #[test]
    fn state_countdown_saturates() {
        let mut state = SamplerState::new(i64::MIN);
        for _ in 0..3 {
            state.on_time_mark();
            assert!(state.admit(record("x")).is_some());
        }
    }

    #[test]
    fn record_groups_insert_marks_on_change() {
        let events: Vec<CaptionEvent> =
            RecordGroups::new(vec![record("a"), record("a"), record("b")].into_iter()).collect();
        assert_eq!(events.len(), 5);
        assert_eq!(events[0], CaptionEvent::TimeMark("a".to_string()));
        assert!(matches!(events[1], CaptionEvent::Record(_)));
        assert!(matches!(events[2], CaptionEvent::Record(_)));
        assert_eq!(events[3], CaptionEvent::TimeMark("b".to_string()));
    }
}

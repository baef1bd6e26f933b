//! Caption classification and telemetry parsing tests.
//!
//! Uses the caption dump in `tests/fixtures/dji_flight.vtt`: ten cues, one
//! telemetry line each, with the line of cue 7 truncated.

use djimeta::{
    CaptionClassifier, CaptionEvent, CaptionEvents, CaptionLine, ParseError, TelemetryParser,
};

const FIXTURE: &str = "tests/fixtures/dji_flight.vtt";

const GPS_LINE: &str = "F/2.8, SS 320, ISO 100, EV 0, DZOOM 1.000, GPS (LATITUDE LONGITUDE 40.1234, -73.9876, ), D 24.35m, H 10.20m, H.S 2.30m/s, V.S 0.10m/s";

fn fixture_dump() -> String {
    std::fs::read_to_string(FIXTURE).expect("Failed to read caption fixture")
}

// ── TelemetryParser ────────────────────────────────────────────────

#[test]
fn parse_reference_line() {
    let record = TelemetryParser::new()
        .parse(GPS_LINE, Some("00:00:03.000"))
        .expect("Failed to parse reference line");

    assert_eq!(record.second, "00:00:03.000");
    assert_eq!(record.gps, vec!["40.1234", "-73.9876"]);
    assert_eq!(record.distance_from_home, "24.35m");
    assert_eq!(record.altitude, "10.20m");
    assert_eq!(record.horizontal_speed, "H.S 2.30m/s");
    assert_eq!(record.vertical_speed, "V.S 0.10m/s");
}

#[test]
fn parse_keeps_third_gps_component() {
    let line = GPS_LINE.replace("-73.9876, )", "-73.9876, 19)");
    let record = TelemetryParser::new()
        .parse(&line, Some("00:00:01.000"))
        .expect("Failed to parse line");
    assert_eq!(record.gps, vec!["40.1234", "-73.9876", "19"]);
}

#[test]
fn parse_without_time_mark_leaves_second_empty() {
    let record = TelemetryParser::new()
        .parse(GPS_LINE, None)
        .expect("Failed to parse line");
    assert!(record.second.is_empty());
    assert_eq!(record.altitude, "10.20m");
}

#[test]
fn parse_short_line_is_malformed() {
    let result = TelemetryParser::new().parse("F/2.8, SS 320, ISO 100", Some("00:00:00.000"));
    assert_eq!(
        result,
        Err(ParseError::MalformedLine {
            required: 12,
            found: 3
        })
    );
}

#[test]
fn parse_eleven_segments_is_malformed() {
    let line = GPS_LINE.rsplit_once(',').expect("line has commas").0;
    let result = TelemetryParser::new().parse(line, Some("00:00:00.000"));
    assert!(
        matches!(result, Err(ParseError::MalformedLine { found: 11, .. })),
        "unexpected result: {result:?}"
    );
}

#[test]
fn parse_empty_altitude_is_rejected() {
    let line = GPS_LINE.replace(" H 10.20m", " H");
    let result = TelemetryParser::new().parse(&line, Some("00:00:00.000"));
    assert_eq!(result, Err(ParseError::EmptyField { field: "altitude" }));
}

#[test]
fn parse_error_messages_are_descriptive() {
    let error = TelemetryParser::new()
        .parse("F/2.8", None)
        .expect_err("short line should fail");
    let message = error.to_string();
    assert!(message.contains("12"), "message should name the requirement: {message}");
}

#[test]
fn record_serializes_with_document_keys() {
    let record = TelemetryParser::new()
        .parse(GPS_LINE, Some("00:00:03.000"))
        .expect("Failed to parse line");
    let value = serde_json::to_value(&record).expect("Failed to serialize record");

    let keys: Vec<&str> = value
        .as_object()
        .expect("record serializes to an object")
        .keys()
        .map(String::as_str)
        .collect();
    for key in ["second", "altitude", "gps", "dst_from_HQ", "hs", "vs"] {
        assert!(keys.contains(&key), "missing key {key}: {keys:?}");
    }
    assert_eq!(value["dst_from_HQ"], "24.35m");
}

// ── CaptionClassifier ──────────────────────────────────────────────

#[test]
fn classifier_recognises_each_line_kind() {
    let classifier = CaptionClassifier::default();
    assert_eq!(
        classifier.classify("00:01.000 --> 00:02.000"),
        CaptionLine::TimeMarker("00:01.000 ")
    );
    assert_eq!(
        classifier.classify(GPS_LINE),
        CaptionLine::TelemetryData(GPS_LINE)
    );
    assert_eq!(classifier.classify("WEBVTT"), CaptionLine::Ignorable);
}

#[test]
fn classifier_prefers_cue_separator() {
    let classifier = CaptionClassifier::default();
    assert_eq!(
        classifier.classify("F/ 00:01.000 --> 00:02.000"),
        CaptionLine::TimeMarker("F/ 00:01.000 ")
    );
}

#[test]
fn classifier_custom_sentinel() {
    let classifier = CaptionClassifier::new("[iso");
    assert_eq!(classifier.sentinel(), "[iso");
    assert_eq!(classifier.classify(GPS_LINE), CaptionLine::Ignorable);
    assert!(matches!(
        classifier.classify("[iso : 100] [shutter : 1/320]"),
        CaptionLine::TelemetryData(_)
    ));
}

// ── CaptionEvents ──────────────────────────────────────────────────

#[test]
fn events_over_fixture() {
    let dump = fixture_dump();
    let events: Vec<CaptionEvent> = CaptionEvents::new(&dump).collect();

    let marks = events
        .iter()
        .filter(|event| matches!(event, CaptionEvent::TimeMark(_)))
        .count();
    let records = events
        .iter()
        .filter(|event| matches!(event, CaptionEvent::Record(_)))
        .count();
    assert_eq!(marks, 10);
    assert_eq!(records, 9);

    let rejected: Vec<&CaptionEvent> = events
        .iter()
        .filter(|event| matches!(event, CaptionEvent::Rejected { .. }))
        .collect();
    assert_eq!(
        rejected,
        vec![&CaptionEvent::Rejected {
            line_number: 29,
            error: ParseError::MalformedLine {
                required: 12,
                found: 6
            },
        }]
    );
}

#[test]
fn events_attach_latest_time_mark() {
    let dump = fixture_dump();
    let seconds: Vec<String> = CaptionEvents::new(&dump)
        .filter_map(|event| match event {
            CaptionEvent::Record(record) => Some(record.second),
            _ => None,
        })
        .collect();

    assert_eq!(seconds.first().map(String::as_str), Some("00:00.000 "));
    assert!(!seconds.iter().any(|second| second == "00:06.000 "));
    assert_eq!(seconds.last().map(String::as_str), Some("00:09.000 "));
}

#[test]
fn events_track_current_mark() {
    let dump = "00:00:01.000 --> 00:00:02.000\nplain caption\n";
    let mut events = CaptionEvents::new(dump);
    assert_eq!(events.current_mark(), None);
    assert_eq!(
        events.next(),
        Some(CaptionEvent::TimeMark("00:00:01.000 ".to_string()))
    );
    assert_eq!(events.current_mark(), Some("00:00:01.000 "));
    assert_eq!(events.next(), None);
}

#[test]
fn serialized_second_keeps_cue_prefix_verbatim() {
    let dump = format!("00:00:03.000 --> 00:00:04.000\n{GPS_LINE}\n");
    let record = CaptionEvents::new(&dump)
        .find_map(|event| match event {
            CaptionEvent::Record(record) => Some(record),
            _ => None,
        })
        .expect("dump holds one record");
    let value = serde_json::to_value(&record).expect("Failed to serialize record");
    assert_eq!(value["second"], "00:00:03.000 ");
}

#[test]
fn events_record_before_first_cue() {
    let dump = format!("{GPS_LINE}\n00:00:01.000 --> 00:00:02.000\n{GPS_LINE}\n");
    let records: Vec<_> = CaptionEvents::new(&dump)
        .filter_map(|event| match event {
            CaptionEvent::Record(record) => Some(record),
            _ => None,
        })
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].second, "");
    assert_eq!(records[1].second, "00:00:01.000 ");
}

#[test]
fn well_formed_fixture_records_have_no_empty_fields() {
    let dump = fixture_dump();
    for event in CaptionEvents::new(&dump) {
        if let CaptionEvent::Record(record) = event {
            assert!(!record.second.is_empty());
            assert!(!record.altitude.is_empty());
            assert!(!record.distance_from_home.is_empty());
            assert!(!record.horizontal_speed.is_empty());
            assert!(!record.vertical_speed.is_empty());
            assert_eq!(record.gps.len(), 3);
            assert!(record.gps.iter().all(|component| !component.is_empty()));
        }
    }
}

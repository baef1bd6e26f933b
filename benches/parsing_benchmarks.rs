//! Benchmarks for caption parsing and sampling.
//!
//! Run with: cargo bench
//!
//! The dumps are generated in memory, so no fixtures or FFmpeg install are
//! needed.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput};
use djimeta::{
    CaptionEvents, DEFAULT_FRAME_SENTINEL, IntervalSampler, TelemetryParser, sample_caption_dump,
};

const LINE: &str = "F/2.8, SS 320, ISO 100, EV 0, DZOOM 1.000, GPS (LATITUDE LONGITUDE 40.1234, -73.9876, 19), D 24.35m, H 10.20m, H.S 2.30m/s, V.S 0.10m/s";

/// A caption dump with `cues` cues at 30 fps, one telemetry line each.
fn synthetic_dump(cues: usize) -> String {
    let mut dump = String::from("WEBVTT\n\n");
    for cue in 0..cues {
        let start = cue as f64 / 30.0;
        let end = (cue + 1) as f64 / 30.0;
        dump.push_str(&format!(
            "{}\n00:00:{start:06.3} --> 00:00:{end:06.3}\n{LINE}\n\n",
            cue + 1
        ));
    }
    dump
}

fn benchmark_line_parsing(criterion: &mut Criterion) {
    let parser = TelemetryParser::new();

    criterion.bench_function("parse single telemetry line", |bencher| {
        bencher.iter(|| parser.parse(black_box(LINE), Some("00:00:01.000")).unwrap());
    });

    criterion.bench_function("reject truncated telemetry line", |bencher| {
        bencher.iter(|| {
            parser
                .parse(black_box("F/2.8, SS 320, ISO 100, EV 0"), None)
                .unwrap_err()
        });
    });
}

fn benchmark_caption_events(criterion: &mut Criterion) {
    let dump = synthetic_dump(1_800);

    let mut group = criterion.benchmark_group("caption events");
    group.throughput(Throughput::Bytes(dump.len() as u64));
    group.bench_function("one minute at 30 fps", |bencher| {
        bencher.iter(|| CaptionEvents::new(black_box(&dump)).count());
    });
    group.finish();
}

fn benchmark_sampling(criterion: &mut Criterion) {
    let dump = synthetic_dump(1_800);

    let mut group = criterion.benchmark_group("interval sampling");
    for interval in [0_i64, 1, 3, 30] {
        group.bench_with_input(
            BenchmarkId::from_parameter(interval),
            &interval,
            |bencher, &interval| {
                bencher.iter(|| {
                    IntervalSampler::new(CaptionEvents::new(black_box(&dump)), interval).count()
                });
            },
        );
    }
    group.finish();

    criterion.bench_function("sample caption dump with report", |bencher| {
        bencher.iter(|| sample_caption_dump(black_box(&dump), DEFAULT_FRAME_SENTINEL, 3));
    });
}

criterion::criterion_group!(
    benches,
    benchmark_line_parsing,
    benchmark_caption_events,
    benchmark_sampling,
);
criterion::criterion_main!(benches);

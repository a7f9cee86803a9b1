//! Performance benchmarks for track-poster-lib
//!
//! Run with: cargo bench --package track-poster-lib

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use geo::{Coord, LineString};
use std::hint::black_box;
use track_poster_lib::{
    GpxParser, Poster, PosterConfig, Track, TrackParser, compute_grid, merge_sessions,
};

/// Generate a realistic GPX document with the specified number of points.
fn generate_gpx(num_points: usize, base_lat: f64, base_lon: f64) -> Vec<u8> {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
    let mut body = String::new();
    for i in 0..num_points {
        let t = i as f64 / num_points as f64;
        let lat = base_lat + t * 0.1 + (t * 50.0).sin() * 0.001;
        let lon = base_lon + t * 0.1 + (t * 30.0).cos() * 0.001;
        let time = start + TimeDelta::seconds(i as i64);
        body.push_str(&format!(
            "<trkpt lat=\"{lat:.6}\" lon=\"{lon:.6}\"><time>{}</time></trkpt>\n",
            time.format("%Y-%m-%dT%H:%M:%SZ")
        ));
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <gpx version=\"1.1\" creator=\"bench\" xmlns=\"http://www.topografix.com/GPX/1/1\">\n\
         <trk><trkseg>\n{body}</trkseg></trk>\n</gpx>\n"
    )
    .into_bytes()
}

/// Generate `num_tracks` sessions, one every 50 minutes, so roughly every other pair merges
fn generate_tracks(num_tracks: usize, points_per_track: usize) -> Vec<Track> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..num_tracks)
        .map(|i| {
            let begin: DateTime<Utc> = start + TimeDelta::minutes(50 * i as i64);
            let lat_offset = (i % 10) as f64 * 0.1;
            let lon_offset = (i / 10) as f64 * 0.1;
            let line: LineString<f64> = (0..points_per_track)
                .map(|p| {
                    let t = p as f64 / points_per_track as f64;
                    Coord {
                        x: -0.1 + lon_offset + t * 0.1,
                        y: 51.5 + lat_offset + (t * 50.0).sin() * 0.001,
                    }
                })
                .collect();
            Track {
                source_files: vec![format!("track-{i}.gpx")],
                polylines: vec![line],
                start_time: Some(begin),
                end_time: Some(begin + TimeDelta::minutes(20 + (i % 3) as i64 * 10)),
                length: 5_000.0,
                highlight: i % 7 == 0,
            }
        })
        .collect()
}

// ============================================================================
// Core Benchmarks
// ============================================================================

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    group.sample_size(20);

    let parser = GpxParser::default();
    for num_points in [1_000, 10_000] {
        let bytes = generate_gpx(num_points, 51.5, -0.1);
        group.throughput(Throughput::Elements(num_points as u64));
        group.bench_with_input(
            BenchmarkId::new("parse_and_simplify", num_points),
            &bytes,
            |b, bytes| {
                b.iter(|| {
                    let mut recording = parser.parse(bytes).unwrap();
                    parser.simplify(&mut recording).unwrap();
                    recording
                });
            },
        );
    }

    group.finish();
}

fn bench_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid");

    for count in [10, 365, 2_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| compute_grid(black_box(count), 180.0, 240.0));
        });
    }

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    let tracks = generate_tracks(1_000, 100);
    group.throughput(Throughput::Elements(tracks.len() as u64));
    group.bench_function("sessions_1k", |b| {
        b.iter(|| merge_sessions(tracks.clone(), TimeDelta::hours(1)));
    });

    group.finish();
}

fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");
    group.sample_size(20);

    // 365 sessions with 1000 points each
    let tracks = generate_tracks(365, 1_000);
    let poster = Poster::new(PosterConfig {
        year: 2024,
        ..Default::default()
    });

    group.throughput(Throughput::Elements(365 * 1_000));
    group.bench_function("365_tracks_1k_each", |b| {
        b.iter(|| poster.compose(&tracks).unwrap());
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(benches, bench_parse, bench_grid, bench_merge, bench_compose);

criterion_main!(benches);

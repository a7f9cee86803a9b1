//! Recording parsers
//!
//! The loader only depends on the [`TrackParser`] trait; [`GpxParser`] is the implementation used
//! by the command line tool.

use crate::projection::{distance_2d, wgs84_to_mercator};
use chrono::{DateTime, Utc};
use geo::{Coord, LineString, SimplifyVwIdx};
use thiserror::Error;

/// Error raised while parsing a single recording
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("GPX parsing error: {0}")]
    Gpx(#[from] gpx::errors::GpxError),

    #[error("Invalid timestamp: {0}")]
    InvalidTime(String),
}

/// Raw content extracted from a recording
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedRecording {
    /// First timed point (second precision)
    pub start_time: Option<DateTime<Utc>>,
    /// Last timed point (second precision)
    pub end_time: Option<DateTime<Utc>>,
    /// 2D length in meters
    pub length: f64,
    /// One point sequence per recorded segment (x = longitude, y = latitude)
    pub polylines: Vec<LineString<f64>>,
}

/// Turns raw recording bytes into timestamped geometry
pub trait TrackParser: Send + Sync {
    /// Parse a whole recording
    fn parse(&self, bytes: &[u8]) -> Result<ParsedRecording, ParseError>;

    /// Reduce point density in place without materially changing the path shape
    ///
    /// Times and length are left untouched.
    fn simplify(&self, recording: &mut ParsedRecording) -> Result<(), ParseError>;
}

/// [`TrackParser`] for GPX 1.0/1.1 documents
#[derive(Debug, Clone)]
pub struct GpxParser {
    /// Visvalingam-Whyatt area tolerance in square Web Mercator meters
    pub simplify_tolerance: f64,
}

impl Default for GpxParser {
    fn default() -> Self {
        Self {
            simplify_tolerance: 100.0,
        }
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl TrackParser for GpxParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedRecording, ParseError> {
        let gpx = gpx::read(bytes)?;

        let mut recording = ParsedRecording::default();
        for track in &gpx.tracks {
            for segment in &track.segments {
                let points = &segment.points;
                if points.is_empty() {
                    continue;
                }

                for waypoint in points {
                    if let Some(time) = waypoint.time {
                        let time = to_utc_seconds(time.into())?;
                        recording.start_time.get_or_insert(time);
                        recording.end_time = Some(time);
                    }
                }

                recording.length += points
                    .windows(2)
                    .map(|pair| distance_2d(pair[0].point(), pair[1].point()))
                    .sum::<f64>();

                recording.polylines.push(
                    points
                        .iter()
                        .map(|waypoint| {
                            let point = waypoint.point();
                            Coord {
                                x: point.x(),
                                y: point.y(),
                            }
                        })
                        .collect(),
                );
            }
        }

        Ok(recording)
    }

    fn simplify(&self, recording: &mut ParsedRecording) -> Result<(), ParseError> {
        for line in &mut recording.polylines {
            if line.0.len() <= 2 {
                continue;
            }

            let mercator: LineString<f64> = line
                .coords()
                .map(|c| {
                    let p = wgs84_to_mercator(c.y, c.x);
                    Coord { x: p.x(), y: p.y() }
                })
                .collect();
            let keep = mercator.simplify_vw_idx(self.simplify_tolerance);

            let before = line.0.len();
            *line = keep.into_iter().map(|i| line.0[i]).collect();
            tracing::trace!("Simplified segment from {} to {} points", before, line.0.len());
        }
        Ok(())
    }
}

/// Convert a GPX timestamp to UTC, dropping sub-second precision
fn to_utc_seconds(odt: time::OffsetDateTime) -> Result<DateTime<Utc>, ParseError> {
    DateTime::from_timestamp(odt.unix_timestamp(), 0)
        .ok_or_else(|| ParseError::InvalidTime(odt.to_string()))
}

//! Track storage module
//!
//! A [`Track`] is one logical recording session: a single GPX file after loading, or several
//! files after the loader has merged recordings that belong to the same outing.

use chrono::{DateTime, Utc};
use geo::LineString;

/// A recording session ready to be laid out on the poster
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    /// Base names of the files that contributed, in temporal order
    pub source_files: Vec<String>,
    /// Point sequences in drawing order (x = longitude, y = latitude, degrees)
    pub polylines: Vec<LineString<f64>>,
    /// First timestamp of the session (`None` when the recording has no timed point)
    pub start_time: Option<DateTime<Utc>>,
    /// Last timestamp of the session
    pub end_time: Option<DateTime<Utc>>,
    /// 2D distance in meters as measured from the raw recording
    pub length: f64,
    /// Drawn in the highlight colour
    pub highlight: bool,
}

impl Track {
    /// Combine two chronologically adjacent tracks into one session
    ///
    /// `next` must start after `self`. Geometry and file names are concatenated, lengths summed,
    /// highlight flags OR'd, and the session ends when `next` ends.
    pub fn merge(self, next: Track) -> Track {
        let mut source_files = self.source_files;
        source_files.extend(next.source_files);
        let mut polylines = self.polylines;
        polylines.extend(next.polylines);

        Track {
            source_files,
            polylines,
            start_time: self.start_time,
            end_time: next.end_time,
            length: self.length + next.length,
            highlight: self.highlight || next.highlight,
        }
    }
}

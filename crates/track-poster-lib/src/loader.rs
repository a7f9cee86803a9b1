//! TrackLoader - Turns a directory of recordings into poster-ready sessions
//!
//! Loading runs in three phases:
//!
//! 1. **Per file** (parallel): checksum, cache lookup, parse + simplify on a miss, cache store.
//!    Every failure is confined to its file and reported as [`FileOutcome::Failed`].
//! 2. **Filter**: tracks without length, without a start time, or from another year are skipped
//!    with a [`SkipReason`].
//! 3. **Merge** (sequential): tracks are sorted by start time and recordings separated by less
//!    than [`LoaderConfig::merge_gap`] are combined into one session. Short sessions are dropped.

use crate::{
    CacheEntry, ContentCache, ParseError, PosterError, Result, Track, TrackParser, checksum,
};
use chrono::{DateTime, TimeDelta, Utc};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Thresholds used while loading
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Sessions shorter than this (meters) are dropped after merging
    pub min_length: f64,
    /// Recordings closer than this are merged into one session
    pub merge_gap: TimeDelta,
    /// File name extension of recordings, without the dot
    pub extension: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            min_length: 1000.0,
            merge_gap: TimeDelta::seconds(3600),
            extension: "gpx".to_string(),
        }
    }
}

/// Result of loading one file
#[derive(Debug)]
pub enum FileOutcome {
    Loaded(Track),
    Failed { file: PathBuf, reason: String },
}

/// Why a loaded track is left off the poster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyTrack,
    MissingStartTime,
    WrongYear(i32),
}

impl SkipReason {
    /// Check a track against the requested year; `None` means the track is kept
    pub fn check(track: &Track, year: i32) -> Option<Self> {
        use chrono::Datelike;

        if track.length == 0.0 {
            return Some(Self::EmptyTrack);
        }
        match track.start_time {
            None => Some(Self::MissingStartTime),
            Some(start) if start.year() != year => Some(Self::WrongYear(start.year())),
            Some(_) => None,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTrack => write!(f, "skipping empty track"),
            Self::MissingStartTime => write!(f, "skipping track without start time"),
            Self::WrongYear(year) => write!(f, "skipping track with wrong year {year}"),
        }
    }
}

/// Loads, filters and merges recordings
pub struct TrackLoader<P> {
    parser: P,
    cache: ContentCache,
    config: LoaderConfig,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<P: TrackParser> TrackLoader<P> {
    /// Create a new loader
    pub fn new(parser: P, cache: ContentCache, config: LoaderConfig) -> Self {
        Self {
            parser,
            cache,
            config,
        }
    }

    /// Load every recording of `year` found directly inside `directory`
    ///
    /// Tracks whose file name is in `highlight_names` are flagged for highlighting. The result is
    /// ordered by start time; it may be empty.
    pub fn load_all(
        &self,
        directory: impl AsRef<Path>,
        year: i32,
        highlight_names: &HashSet<String>,
    ) -> Result<Vec<Track>> {
        #[cfg(feature = "profiling")]
        profiling::scope!("loader::load_all");

        let files = self.list_files(directory.as_ref())?;
        let total = files.len();

        let outcomes: Vec<FileOutcome> = files
            .par_iter()
            .enumerate()
            .map(|(index, file)| {
                tracing::info!("loading file {}/{}", index + 1, total);
                self.load_file(file)
            })
            .collect();

        let mut tracks = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            let mut track = match outcome {
                FileOutcome::Loaded(track) => track,
                FileOutcome::Failed { file, reason } => {
                    tracing::warn!("{}: error while parsing GPX file; {}", file.display(), reason);
                    continue;
                }
            };

            if track
                .source_files
                .iter()
                .any(|name| highlight_names.contains(name))
            {
                track.highlight = true;
            }

            match SkipReason::check(&track, year) {
                Some(reason) => tracing::info!("{}: {}", track.source_files.join(", "), reason),
                None => tracks.push(track),
            }
        }

        // Stable sort keeps encounter order for equal start times
        tracks.sort_by_key(|track| track.start_time);

        let sessions = merge_sessions(tracks, self.config.merge_gap);
        Ok(sessions
            .into_iter()
            .filter(|session| session.length >= self.config.min_length)
            .collect())
    }

    /// List recording files directly inside `directory`, sorted by name
    pub fn list_files(&self, directory: &Path) -> Result<Vec<PathBuf>> {
        if !directory.is_dir() {
            return Err(PosterError::Directory {
                path: directory.to_path_buf(),
            });
        }

        let suffix = format!(".{}", self.config.extension);
        let mut files = Vec::new();
        for entry in std::fs::read_dir(directory)? {
            let path = entry?.path();
            let is_recording = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(&suffix));
            if is_recording && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Load a single file, going through the cache
    pub fn load_file(&self, path: &Path) -> FileOutcome {
        let file_name = base_name(path);
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                return FileOutcome::Failed {
                    file: path.to_path_buf(),
                    reason: e.to_string(),
                };
            }
        };
        let key = checksum(&bytes);

        if let Some(entry) = self.cache.get(&key) {
            tracing::debug!("{}: cached", path.display());
            return FileOutcome::Loaded(entry.into_track(file_name));
        }

        match self.parse(&bytes, file_name) {
            Ok(track) => {
                match CacheEntry::from_track(&track) {
                    Some(entry) => {
                        if let Err(e) = self.cache.put(&key, &entry) {
                            tracing::warn!("{e}");
                        }
                    }
                    None => tracing::debug!("{}: not cached, no time bounds", path.display()),
                }
                FileOutcome::Loaded(track)
            }
            Err(e) => FileOutcome::Failed {
                file: path.to_path_buf(),
                reason: e.to_string(),
            },
        }
    }

    fn parse(&self, bytes: &[u8], file_name: String) -> std::result::Result<Track, ParseError> {
        let mut recording = self.parser.parse(bytes)?;
        self.parser.simplify(&mut recording)?;

        Ok(Track {
            source_files: vec![file_name],
            polylines: recording.polylines,
            start_time: recording.start_time,
            end_time: recording.end_time,
            length: recording.length,
            highlight: false,
        })
    }
}

/// Merge chronologically sorted tracks that are less than `merge_gap` apart
///
/// A track joins the previous session when its start lies strictly after the end of the previous
/// *track* and strictly less than `merge_gap` later. Overlapping or touching recordings stay
/// separate.
pub fn merge_sessions(tracks: Vec<Track>, merge_gap: TimeDelta) -> Vec<Track> {
    let mut sessions: Vec<Track> = Vec::with_capacity(tracks.len());
    let mut last_end_time: Option<DateTime<Utc>> = None;

    for track in tracks {
        let end_time = track.end_time;
        let gap = match (last_end_time, track.start_time) {
            (Some(last_end), Some(start)) => Some(start - last_end),
            _ => None,
        };
        let merges = gap.is_some_and(|dt| dt > TimeDelta::zero() && dt < merge_gap);

        match sessions.pop() {
            Some(previous) if merges => {
                tracing::info!(
                    "Merging track with previous, due to time distance of {}s.",
                    gap.map_or(0, |dt| dt.num_seconds())
                );
                sessions.push(previous.merge(track));
            }
            previous => {
                sessions.extend(previous);
                sessions.push(track);
            }
        }
        last_end_time = end_time;
    }

    sessions
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

//! Content-addressed track cache
//!
//! Parsing and simplifying a GPX file is by far the slowest step of poster generation, so the
//! result is stored on disk keyed by the SHA-256 checksum of the raw file bytes. A checksum always
//! maps to the same geometry, which means entries are never updated in place and never evicted;
//! [`ContentCache::clear`] is the only way to delete them.
//!
//! Layout on disk: `<root>/tracks/<checksum>.json`, one JSON document per entry:
//!
//! ```json
//! { "start": "2024-05-01 10:00:00", "end": "2024-05-01 11:00:00", "length": 1234.5,
//!   "segments": [[{"lat": 47.0, "lng": 8.0}, {"lat": 47.01, "lng": 8.0}]] }
//! ```
//!
//! The cache root is injected by the caller so the component can be pointed at a scratch
//! directory; resolving the per-user cache directory is the binary's job.

use crate::Track;
use chrono::{DateTime, Utc};
use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to read cache entry {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed cache entry {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to write cache entry {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to remove cache dir {}: {source}", path.display())]
    Clear {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Compute the cache key of a file: the lowercase hex SHA-256 of its bytes
pub fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// A geographic point as stored in a cache entry
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Persisted parse result of one GPX file
///
/// File names and the highlight flag are not stored: they depend on where and how the
/// file is loaded, not on its content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(with = "timestamp")]
    pub start: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub end: DateTime<Utc>,
    pub length: f64,
    pub segments: Vec<Vec<LatLng>>,
}

impl CacheEntry {
    /// Build an entry from a freshly parsed track
    ///
    /// Returns `None` for tracks without time bounds, which the cache format cannot represent.
    /// Timestamps are stored with second precision.
    pub fn from_track(track: &Track) -> Option<Self> {
        Some(Self {
            start: track.start_time?,
            end: track.end_time?,
            length: track.length,
            segments: track
                .polylines
                .iter()
                .map(|line| {
                    line.coords()
                        .map(|c| LatLng { lat: c.y, lng: c.x })
                        .collect()
                })
                .collect(),
        })
    }

    /// Hydrate a track loaded from `file_name`
    pub fn into_track(self, file_name: String) -> Track {
        Track {
            source_files: vec![file_name],
            polylines: self
                .segments
                .into_iter()
                .map(|segment| {
                    LineString::new(
                        segment
                            .into_iter()
                            .map(|p| Coord { x: p.lng, y: p.lat })
                            .collect(),
                    )
                })
                .collect(),
            start_time: Some(self.start),
            end_time: Some(self.end),
            length: self.length,
            highlight: false,
        }
    }
}

/// Serde adapter for `YYYY-MM-DD HH:MM:SS` UTC timestamps
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(
        time: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}

/// Distinguishes temporary files written concurrently by the same process
static TMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// File-backed cache of parsed tracks, one JSON file per checksum
#[derive(Clone, Debug)]
pub struct ContentCache {
    /// Directory holding the entry files
    dir: PathBuf,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl ContentCache {
    /// Create a cache rooted at `root`; nothing is touched on disk until the first write
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            dir: root.as_ref().join("tracks"),
        }
    }

    /// Directory holding the entry files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, checksum: &str) -> PathBuf {
        self.dir.join(format!("{checksum}.json"))
    }

    /// Look up an entry, treating any failure as a miss
    pub fn get(&self, checksum: &str) -> Option<CacheEntry> {
        match self.read(checksum) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Failed to load cached track: {e}");
                None
            }
        }
    }

    /// Look up an entry; `Ok(None)` when no entry exists for `checksum`
    pub fn read(&self, checksum: &str) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.entry_path(checksum);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Read { path, source }),
        };
        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|source| CacheError::Json { path, source })
    }

    /// Store an entry
    ///
    /// The document is written to a temporary file and renamed into place, so readers and
    /// concurrent writers of the same checksum never see a partial file.
    pub fn put(&self, checksum: &str, entry: &CacheEntry) -> Result<(), CacheError> {
        let path = self.entry_path(checksum);
        let write_err = |source| CacheError::Write {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(write_err)?;
        let json = serde_json::to_vec(entry).map_err(|e| write_err(std::io::Error::other(e)))?;

        let tmp = self.dir.join(format!(
            ".{checksum}.{}.{}.tmp",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        if let Err(e) = fs::write(&tmp, json).and_then(|()| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(write_err(e));
        }
        Ok(())
    }

    /// Remove every entry
    pub fn clear(&self) -> Result<(), CacheError> {
        if !self.dir.is_dir() {
            return Ok(());
        }
        tracing::info!("Removing cache dir: {}", self.dir.display());
        fs::remove_dir_all(&self.dir).map_err(|source| CacheError::Clear {
            path: self.dir.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_entry() -> CacheEntry {
        CacheEntry {
            start: Utc.with_ymd_and_hms(2024, 3, 9, 7, 15, 2).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 3, 9, 8, 40, 59).unwrap(),
            length: 10234.567891234,
            segments: vec![
                vec![
                    LatLng {
                        lat: 47.376887,
                        lng: 8.541694,
                    },
                    LatLng {
                        lat: 47.3769001234567,
                        lng: 8.5419876543219,
                    },
                ],
                vec![LatLng {
                    lat: -33.8688197,
                    lng: 151.2092955,
                }],
            ],
        }
    }

    #[test]
    fn test_checksum_is_sha256_hex() {
        assert_eq!(
            checksum(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(checksum(b"abc").len(), 64);
        assert_ne!(checksum(b"abc"), checksum(b"abd"));
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ContentCache::new(dir.path());
        let entry = sample_entry();

        cache.put("abc", &entry).unwrap();
        let loaded = cache.get("abc").unwrap();

        assert_eq!(loaded, entry);
        assert_eq!(loaded.length.to_bits(), entry.length.to_bits());
    }

    #[test]
    fn test_track_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ContentCache::new(dir.path());
        let track = sample_entry().into_track("run.gpx".to_string());

        cache
            .put("k", &CacheEntry::from_track(&track).unwrap())
            .unwrap();
        let loaded = cache.get("k").unwrap().into_track("run.gpx".to_string());

        assert_eq!(loaded, track);
    }

    #[test]
    fn test_put_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ContentCache::new(dir.path());
        let entry = sample_entry();

        cache.put("same", &entry).unwrap();
        cache.put("same", &entry).unwrap();

        assert_eq!(cache.get("same"), Some(entry));
        let files: Vec<_> = fs::read_dir(cache.dir()).unwrap().collect();
        assert_eq!(files.len(), 1, "temporary files must not be left behind");
    }

    #[test]
    fn test_missing_entry_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ContentCache::new(dir.path());
        assert!(cache.read("nothing").unwrap().is_none());
        assert!(cache.get("nothing").is_none());
    }

    #[test]
    fn test_corrupted_entry_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ContentCache::new(dir.path());
        fs::create_dir_all(cache.dir()).unwrap();
        fs::write(cache.dir().join("bad.json"), b"{ not json").unwrap();

        assert!(matches!(cache.read("bad"), Err(CacheError::Json { .. })));
        assert!(cache.get("bad").is_none());
    }

    #[test]
    fn test_missing_field_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ContentCache::new(dir.path());
        fs::create_dir_all(cache.dir()).unwrap();
        fs::write(
            cache.dir().join("partial.json"),
            br#"{"start": "2024-01-01 00:00:00", "end": "2024-01-01 01:00:00", "segments": []}"#,
        )
        .unwrap();

        assert!(cache.get("partial").is_none());
    }

    #[test]
    fn test_malformed_timestamp_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ContentCache::new(dir.path());
        fs::create_dir_all(cache.dir()).unwrap();
        fs::write(
            cache.dir().join("time.json"),
            br#"{"start": "yesterday", "end": "2024-01-01 01:00:00", "length": 1.0, "segments": []}"#,
        )
        .unwrap();

        assert!(cache.get("time").is_none());
    }

    #[test]
    fn test_persisted_format() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ContentCache::new(dir.path());
        cache.put("fmt", &sample_entry()).unwrap();

        let raw = fs::read_to_string(cache.dir().join("fmt.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["start"], "2024-03-09 07:15:02");
        assert_eq!(value["end"], "2024-03-09 08:40:59");
        assert_eq!(value["segments"][1][0]["lng"], 151.2092955);
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ContentCache::new(dir.path());
        cache.put("a", &sample_entry()).unwrap();

        cache.clear().unwrap();

        assert!(!cache.dir().exists());
        assert!(cache.get("a").is_none());
        // Clearing an absent store is fine
        cache.clear().unwrap();
    }

    #[test]
    fn test_from_track_requires_times() {
        let mut track = sample_entry().into_track("x.gpx".to_string());
        track.start_time = None;
        assert!(CacheEntry::from_track(&track).is_none());
    }
}

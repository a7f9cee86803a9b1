//! Track Poster Library - Core pipeline for turning a year of GPX recordings into a poster
//!
//! This library loads a directory of GPX recordings, merges recordings that belong to the same
//! outing, and lays the resulting sessions out on a grid of square tiles ready for rendering.
//!
//! # Architecture
//!
//! - **[`ContentCache`]**: Content-addressed (SHA-256) store of parsed track geometry
//! - **[`TrackLoader`]**: Enumerates, parses (or hydrates from cache), filters and merges tracks
//! - **[`projection`]**: Web-Mercator style projection and bounding boxes
//! - **[`compute_grid`]**: Chooses the tile size that wastes the least poster area
//! - **[`Poster`]**: Combines everything into a [`PosterDrawing`] handed to a [`Renderer`]
//!
//! # Example
//!
//! ```rust,no_run
//! use std::collections::HashSet;
//! use track_poster_lib::{
//!     ContentCache, GpxParser, LoaderConfig, Poster, PosterConfig, Renderer, SvgRenderer,
//!     TrackLoader,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = ContentCache::new("/tmp/track-poster-cache");
//! let loader = TrackLoader::new(GpxParser::default(), cache, LoaderConfig::default());
//! let tracks = loader.load_all("./gpx", 2024, &HashSet::new())?;
//!
//! let drawing = Poster::new(PosterConfig::default()).compose(&tracks)?;
//! SvgRenderer::new("poster.svg").render(&drawing)?;
//! # Ok(())
//! # }
//! ```

mod cache;
mod grid;
mod loader;
mod parser;
mod poster;
pub mod projection;
mod render;
mod track;

// Public API exports
pub use cache::{CacheEntry, CacheError, ContentCache, LatLng, checksum};
pub use grid::{GridLayout, compute_grid};
pub use loader::{FileOutcome, LoaderConfig, SkipReason, TrackLoader, merge_sessions};
pub use parser::{GpxParser, ParseError, ParsedRecording, TrackParser};
pub use poster::{
    Colors, Poster, PosterConfig, PosterDrawing, PosterStats, TextLabel, TrackDrawing,
    TracksArea,
};
pub use render::{Renderer, SvgRenderer};
pub use track::Track;

/// Error types that abort poster generation
///
/// Per-file problems (parse failures, unreadable cache entries) never surface here; the loader
/// logs and skips them.
#[derive(Debug, thiserror::Error)]
pub enum PosterError {
    #[error("Not a directory: {}", path.display())]
    Directory { path: std::path::PathBuf },

    #[error("No grid layout fits {count} tiles into {width}x{height}")]
    Layout { count: usize, width: f64, height: f64 },

    #[error("No tracks found")]
    EmptyResult,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PosterError>;

//! Poster composition
//!
//! [`Poster::compose`] turns the final list of sessions into a [`PosterDrawing`]: absolute text
//! labels and, for every session, polylines already projected, scaled and centred in its grid
//! tile. Renderers only have to draw what they are given.

use crate::projection::{compute_bounds, project_polylines};
use crate::{GridLayout, PosterError, Result, Track, compute_grid};
use chrono::Datelike;
use geo::Coord;

/// Fraction of a tile kept free on its leading edges
const TILE_MARGIN: f64 = 0.05;

/// Colours used on the poster, as SVG colour strings
#[derive(Debug, Clone, PartialEq)]
pub struct Colors {
    pub background: String,
    pub track: String,
    pub highlight: String,
    pub text: String,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            background: "#222222".to_string(),
            track: "#4DD2FF".to_string(),
            highlight: "#FFFF00".to_string(),
            text: "#FFFFFF".to_string(),
        }
    }
}

/// Rectangle of the poster reserved for track tiles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TracksArea {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Poster appearance and labels
#[derive(Debug, Clone)]
pub struct PosterConfig {
    /// Canvas width (millimeters when rendered as SVG)
    pub width: f64,
    /// Canvas height
    pub height: f64,
    pub tracks_area: TracksArea,
    pub colors: Colors,
    pub title: String,
    pub athlete: String,
    pub year: i32,
}

impl Default for PosterConfig {
    fn default() -> Self {
        let (width, height) = (200.0, 300.0);
        Self {
            width,
            height,
            tracks_area: TracksArea {
                x: 10.0,
                y: 30.0,
                width: width - 20.0,
                height: height - 30.0 - 30.0,
            },
            colors: Colors::default(),
            title: "My Tracks".to_string(),
            athlete: "John Doe".to_string(),
            year: chrono::Utc::now().year() - 1,
        }
    }
}

/// Summary figures printed on the poster
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PosterStats {
    pub count: usize,
    /// Sessions per week over a 52 week year
    pub weekly: f64,
    pub total_km: f64,
    pub average_km: f64,
    pub min_km: f64,
    pub max_km: f64,
}

impl PosterStats {
    /// Compute statistics over all sessions; `None` when there are none
    pub fn from_tracks(tracks: &[Track]) -> Option<Self> {
        let first = tracks.first()?.length;
        let (total, min, max) = tracks.iter().fold((0.0, first, first), |(total, min, max), t| {
            (total + t.length, f64::min(min, t.length), f64::max(max, t.length))
        });
        let count = tracks.len();

        Some(Self {
            count,
            weekly: count as f64 / 52.0,
            total_km: 0.001 * total,
            average_km: 0.001 * total / count as f64,
            min_km: 0.001 * min,
            max_km: 0.001 * max,
        })
    }
}

/// A positioned piece of text
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub text: String,
    /// Baseline start
    pub position: Coord<f64>,
    pub font_size: f64,
    pub bold: bool,
    pub color: String,
}

/// One session, ready to be stroked
#[derive(Debug, Clone, PartialEq)]
pub struct TrackDrawing {
    /// Polylines in poster coordinates
    pub lines: Vec<Vec<Coord<f64>>>,
    pub color: String,
}

/// Everything a [`crate::Renderer`] needs to draw the poster
#[derive(Debug, Clone, PartialEq)]
pub struct PosterDrawing {
    pub width: f64,
    pub height: f64,
    pub background: String,
    pub labels: Vec<TextLabel>,
    pub tracks: Vec<TrackDrawing>,
    pub stats: PosterStats,
    pub grid: GridLayout,
}

/// Lays sessions out on a poster
#[derive(Debug, Clone, Default)]
pub struct Poster {
    config: PosterConfig,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Poster {
    pub fn new(config: PosterConfig) -> Self {
        Self { config }
    }

    /// Compute the drawing for `tracks`, in the given order
    pub fn compose(&self, tracks: &[Track]) -> Result<PosterDrawing> {
        let stats = PosterStats::from_tracks(tracks).ok_or(PosterError::EmptyResult)?;
        let area = self.config.tracks_area;
        let grid = compute_grid(tracks.len(), area.width, area.height)?;
        tracing::debug!(
            "Grid: {} columns x {} rows of {:.2}",
            grid.columns,
            grid.rows,
            grid.tile_size
        );

        let size = grid.tile_size;
        let drawings = tracks
            .iter()
            .enumerate()
            .map(|(index, track)| {
                let (column, row) = grid.cell(index);
                let (column, row) = (column as f64, row as f64);
                let origin = Coord {
                    x: area.x + (TILE_MARGIN + column) * size,
                    y: area.y + (TILE_MARGIN + row) * size + row * grid.row_spacing,
                };
                let tile = (1.0 - 2.0 * TILE_MARGIN) * size;
                let color = if track.highlight {
                    &self.config.colors.highlight
                } else {
                    &self.config.colors.track
                };
                TrackDrawing {
                    lines: fit_into_tile(track, origin, tile, tile),
                    color: color.clone(),
                }
            })
            .collect();

        Ok(PosterDrawing {
            width: self.config.width,
            height: self.config.height,
            background: self.config.colors.background.clone(),
            labels: self.labels(&stats),
            tracks: drawings,
            stats,
            grid,
        })
    }

    fn labels(&self, stats: &PosterStats) -> Vec<TextLabel> {
        let h = self.config.height;
        let color = &self.config.colors.text;
        let label = |text: String, x: f64, y: f64, font_size: f64| TextLabel {
            text,
            position: Coord { x, y },
            font_size,
            bold: false,
            color: color.clone(),
        };

        vec![
            TextLabel {
                bold: true,
                ..label(self.config.title.clone(), 10.0, 20.0, 12.0)
            },
            label("YEAR".to_string(), 10.0, h - 20.0, 4.0),
            label(self.config.year.to_string(), 10.0, h - 10.0, 9.0),
            label("ATHLETE".to_string(), 40.0, h - 20.0, 4.0),
            label(self.config.athlete.clone(), 40.0, h - 10.0, 9.0),
            label("STATISTICS".to_string(), 120.0, h - 20.0, 4.0),
            label(format!("Runs: {}", stats.count), 120.0, h - 15.0, 3.0),
            label(format!("Weekly: {:.1}", stats.weekly), 120.0, h - 10.0, 3.0),
            label(format!("Total: {:.1} km", stats.total_km), 139.0, h - 15.0, 3.0),
            label(format!("Avg: {:.1} km", stats.average_km), 139.0, h - 10.0, 3.0),
            label(format!("Min: {:.1} km", stats.min_km), 167.0, h - 15.0, 3.0),
            label(format!("Max: {:.1} km", stats.max_km), 167.0, h - 10.0, 3.0),
        ]
    }
}

/// Project a track and scale it uniformly to fit, centred, in the given rectangle
fn fit_into_tile(
    track: &Track,
    origin: Coord<f64>,
    width: f64,
    height: f64,
) -> Vec<Vec<Coord<f64>>> {
    let lines = project_polylines(&track.polylines);
    let Some(bounds) = compute_bounds(&lines) else {
        tracing::warn!("{}: nothing to draw", track.source_files.join(", "));
        return Vec::new();
    };

    let (dx, dy) = (bounds.width(), bounds.height());
    let scale = match (dx > 0.0, dy > 0.0) {
        (true, true) => f64::min(width / dx, height / dy),
        (true, false) => width / dx,
        (false, true) => height / dy,
        (false, false) => 0.0,
    };
    let offset = Coord {
        x: origin.x + 0.5 * width - 0.5 * scale * dx,
        y: origin.y + 0.5 * height - 0.5 * scale * dy,
    };
    let min = bounds.min();

    lines
        .into_iter()
        .map(|line| {
            line.into_iter()
                .map(|p| Coord {
                    x: offset.x + scale * (p.x - min.x),
                    y: offset.y + scale * (p.y - min.y),
                })
                .collect()
        })
        .collect()
}

use chrono::Datelike;
use clap::Parser;
use std::collections::HashSet;
use std::path::PathBuf;
use track_poster_lib::{Colors, LoaderConfig, PosterConfig};

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Track Poster - Render a year of GPX recordings as a grid poster
pub struct Settings {
    /// Directory containing the GPX files
    #[clap(long, value_name = "DIR", default_value = ".")]
    pub gpx_dir: PathBuf,

    /// Year to draw (defaults to the previous calendar year)
    #[clap(long)]
    pub year: Option<i32>,

    /// Poster title
    #[clap(long, default_value = "My Tracks")]
    pub title: String,

    /// Name printed in the athlete section
    #[clap(long, default_value = "John Doe")]
    pub athlete: String,

    #[clap(long, default_value = "#222222")]
    pub background_color: String,

    #[clap(long, default_value = "#4DD2FF")]
    pub track_color: String,

    #[clap(long, default_value = "#FFFFFF")]
    pub text_color: String,

    /// Base name of a GPX file to highlight (repeatable)
    #[clap(long, value_name = "FILE")]
    pub highlight: Vec<String>,

    #[clap(long, default_value = "#FFFF00")]
    pub highlight_color: String,

    /// Name of the generated SVG file
    #[clap(short, long, value_name = "FILE", default_value = "poster.svg")]
    pub output: PathBuf,

    /// Delete all cached track data before loading
    #[clap(long, default_value = "false")]
    pub clear_cache: bool,

    /// Cache directory (defaults to the platform cache location)
    #[clap(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Record a Chrome trace of the run into this file
    #[cfg(feature = "profiling")]
    #[clap(long, value_name = "FILE")]
    pub trace_file: Option<PathBuf>,
}

impl Settings {
    /// The requested year, or the one before the current one
    pub fn year(&self) -> i32 {
        self.year.unwrap_or_else(|| chrono::Utc::now().year() - 1)
    }

    /// Base names given with `--highlight`
    pub fn highlight_set(&self) -> HashSet<String> {
        self.highlight.iter().cloned().collect()
    }

    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig::default()
    }

    pub fn poster_config(&self) -> PosterConfig {
        PosterConfig {
            colors: Colors {
                background: self.background_color.clone(),
                track: self.track_color.clone(),
                highlight: self.highlight_color.clone(),
                text: self.text_color.clone(),
            },
            title: self.title.clone(),
            athlete: self.athlete.clone(),
            year: self.year(),
            ..Default::default()
        }
    }
}

mod logging;
mod settings;

use clap::Parser;
use settings::Settings;
use std::path::PathBuf;
use std::process::ExitCode;
use track_poster_lib::{
    ContentCache, GpxParser, Poster, PosterError, Renderer, SvgRenderer, TrackLoader,
};

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("No cache directory available on this platform, pass --cache-dir")]
    NoCacheDir,

    #[error(transparent)]
    Poster(#[from] PosterError),
}

fn main() -> ExitCode {
    let settings = Settings::parse();
    let _guard: logging::ProfilingGuard = logging::setup_logging_and_profiling(&settings);

    match run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn cache_root(settings: &Settings) -> Result<PathBuf, AppError> {
    if let Some(dir) = &settings.cache_dir {
        return Ok(dir.clone());
    }
    let dirs = directories::ProjectDirs::from("com.github", "yeicor", "track-poster")
        .ok_or(AppError::NoCacheDir)?;
    Ok(dirs.cache_dir().to_path_buf())
}

fn run(settings: &Settings) -> Result<(), AppError> {
    profiling::scope!("run");

    let cache = ContentCache::new(cache_root(settings)?);
    if settings.clear_cache {
        tracing::info!("Clearing cache at {}", cache.dir().display());
        if let Err(e) = cache.clear() {
            tracing::error!("{e}");
        }
    }

    let year = settings.year();
    let loader = TrackLoader::new(GpxParser::default(), cache, settings.loader_config());
    let tracks = loader.load_all(&settings.gpx_dir, year, &settings.highlight_set())?;
    tracing::info!("Loaded {} sessions for {year}", tracks.len());

    let drawing = Poster::new(settings.poster_config()).compose(&tracks)?;
    SvgRenderer::new(&settings.output).render(&drawing)?;
    Ok(())
}

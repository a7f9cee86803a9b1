/*!
Logging and profiling setup for the track-poster binary.

Two implementations share one entry point:

- real: compiled with `feature = "profiling"`. Adds a `tracing-chrome` layer when a trace file
  is requested; the returned guard flushes the file when dropped.
- stub: logging only, the guard is `()`.

`RUST_LOG` overrides the default filter in both.
*/

use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    })
}

#[cfg(feature = "profiling")]
mod inner {
    use crate::settings::Settings;
    use tracing_chrome::{ChromeLayerBuilder, FlushGuard};
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    /// Keeps the trace file open until dropped
    pub type ProfilingGuard = Option<FlushGuard>;

    pub fn setup_logging_and_profiling(settings: &Settings) -> ProfilingGuard {
        let (chrome_layer, guard) = match &settings.trace_file {
            Some(path) => {
                let (layer, guard) = ChromeLayerBuilder::new().file(path).build();
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        let fmt_layer = fmt::layer().with_filter(super::env_filter());
        tracing_subscriber::registry()
            .with(chrome_layer)
            .with(fmt_layer)
            .init();

        if let Some(path) = &settings.trace_file {
            tracing::info!("Recording profiling trace to {}", path.display());
        }
        guard
    }
}

#[cfg(not(feature = "profiling"))]
mod inner {
    use crate::settings::Settings;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    pub type ProfilingGuard = ();

    /// Initialize logging; profiling is a no-op here.
    pub fn setup_logging_and_profiling(_settings: &Settings) -> ProfilingGuard {
        let fmt_layer = fmt::layer().with_filter(super::env_filter());
        tracing_subscriber::registry().with(fmt_layer).init();
        tracing::debug!("Logging initialized (profiling disabled in this build)");
    }
}

pub use inner::{ProfilingGuard, setup_logging_and_profiling};

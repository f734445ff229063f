use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{Registry, fmt, reload};

/// Level from a `LOG_LEVEL`-style string; anything unrecognized is `info`
pub fn parse_level(level: &str) -> Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Changes the level of the installed subscriber after startup
pub struct LogHandle(reload::Handle<LevelFilter, Registry>);

impl LogHandle {
    pub fn set_level(&self, level: &str) -> Result<()> {
        self.0
            .reload(LevelFilter::from_level(parse_level(level)))
            .context("Failed to change log level")
    }
}

/// Install the global fmt subscriber. Call once, before anything logs; the
/// level can be replaced later through the returned handle once config is read.
pub fn init_logging(level: &str) -> Result<LogHandle> {
    let (filter, handle) = reload::Layer::new(LevelFilter::from_level(parse_level(level)));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_thread_names(true))
        .try_init()
        .context("Failed to install tracing subscriber")?;
    Ok(LogHandle(handle))
}

//! Tracing setup shared by the binaries.

use crate::config::base_dir;
use crate::error::{Result, StubError};
use std::path::PathBuf;
use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Where and how loudly a component logs.
#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Prefix of the log files, e.g. `cli.2026-01-21.log`.
    pub component: String,
    pub dir: PathBuf,
    /// Echo events to stderr as well.
    pub stderr: bool,
    /// Used when `RUST_LOG` is unset.
    pub default_level: Level,
}

impl LogSettings {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            dir: base_dir().join("logs"),
            stderr: false,
            default_level: Level::INFO,
        }
    }

    /// Verbose runs also log to stderr, at debug level.
    pub fn verbose(mut self, verbose: bool) -> Self {
        if verbose {
            self.stderr = true;
            self.default_level = Level::DEBUG;
        }
        self
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(self.default_level).into())
            .from_env_lossy()
    }
}

/// Install the global subscriber: a daily rolling file in `settings.dir`,
/// plus stderr output when asked for.
///
/// Keep the returned guard alive for as long as logs should be flushed. A
/// subscriber installed earlier stays in place.
pub fn init_logging(settings: &LogSettings) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&settings.dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(settings.component.as_str())
        .filename_suffix("log")
        .build(&settings.dir)
        .map_err(|e| StubError::Io(std::io::Error::other(e.to_string())))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);
    let stderr_layer = settings.stderr.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    let _ = tracing_subscriber::registry()
        .with(settings.filter())
        .with(file_layer)
        .with(stderr_layer)
        .try_init();
    Ok(guard)
}

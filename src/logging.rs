//! Logging configuration with journald support on Linux.
//!
//! Sets up tracing-based logging that goes to the systemd journal when it
//! is reachable and to a daily rolling file otherwise. Console output is
//! opt-in through `verbose`, so the report printed on stdout stays clean.

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging system.
///
/// Log level can be controlled via the `PHOTO_ORGANIZER_LOG` environment
/// variable (`debug`, `info`, `warn`, `error`); the default is `info`.
pub fn init(log_dir: Option<PathBuf>, verbose: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_env("PHOTO_ORGANIZER_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));

    #[cfg(target_os = "linux")]
    {
        if let Ok(journald_layer) = tracing_journald::layer() {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(journald_layer)
                .with(verbose.then(|| fmt::layer().with_writer(std::io::stderr)))
                .init();

            tracing::debug!("Logging initialized with journald backend");
            return Ok(());
        }
    }

    let log_dir = log_dir.unwrap_or_else(|| {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("photo-organizer")
            .join("logs")
    });

    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "photo-organizer.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The worker must outlive every log call; init() runs once per process.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(verbose.then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();

    tracing::debug!("Logging initialized with file backend at {:?}", log_dir);
    Ok(())
}

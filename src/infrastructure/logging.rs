//! Logging system configuration and initialization
//!
//! - Console output, plain or JSON
//! - Optional daily rolling log file written through a non-blocking worker
//! - `RUST_LOG` overrides the configured filter

use std::sync::{Mutex, PoisonError};

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::fmt::{self, time::ChronoLocal};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

pub use crate::infrastructure::config::LoggingConfig;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

// Keeps the file writer alive for the lifetime of the process
static LOG_GUARDS: Lazy<Mutex<Vec<WorkerGuard>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Filter directive built from the configured level and module filters.
///
/// Module filters are sorted by target so the directive is stable.
pub fn filter_directive(config: &LoggingConfig) -> String {
    let mut targets: Vec<_> = config.module_filters.iter().collect();
    targets.sort();

    let mut directive = config.level.trim().to_string();
    for (target, level) in targets {
        directive.push_str(&format!(",{target}={level}"));
    }
    directive
}

/// Initialize logging with the given configuration
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(filter_directive(config))
            .map_err(|e| anyhow!("Invalid log filter '{}': {}", filter_directive(config), e))?,
    };

    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.console_output {
        let console = fmt::layer()
            .with_writer(std::io::stdout)
            .with_timer(ChronoLocal::rfc_3339())
            .with_target(false);
        layers.push(if config.json_format { console.json().boxed() } else { console.boxed() });
    }

    if config.file_output {
        std::fs::create_dir_all(&config.log_directory).map_err(|e| {
            anyhow!("Failed to create log directory {}: {}", config.log_directory.display(), e)
        })?;
        let appender = rolling::daily(&config.log_directory, format!("{}.log", config.file_prefix));
        let (writer, guard) = non_blocking(appender);
        LOG_GUARDS.lock().unwrap_or_else(PoisonError::into_inner).push(guard);

        let file = fmt::layer()
            .with_writer(writer)
            .with_timer(ChronoLocal::rfc_3339())
            .with_ansi(false);
        layers.push(if config.json_format {
            file.json().with_file(true).with_line_number(true).boxed()
        } else {
            file.with_target(false).boxed()
        });
    }

    if layers.is_empty() {
        return Err(anyhow!("No logging output configured"));
    }

    Registry::default()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    info!("Logging system initialized");
    info!("Log filter: {}", filter_directive(config));
    if config.file_output {
        info!("Log directory: {}", config.log_directory.display());
    }
    Ok(())
}

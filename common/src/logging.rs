//! Structured logging initialization
//!
//! Provides consistent logging initialization across components.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Guard that keeps the tracing subscriber active.
/// Drop this at the end of main to flush logs.
pub struct LogGuard;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

impl LogFormat {
    /// Parse a `LOG_FORMAT` value; anything but "json" means human output.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Human
        }
    }
}

/// Initialize structured logging for a component.
///
/// Returns a guard that should be held for the lifetime of the program.
/// Logs go to stderr so stdout stays free for the final report.
///
/// # Example
/// ```ignore
/// let _guard = init_logging("pg-provision", LogFormat::Human);
/// info!("Starting up...");
/// ```
pub fn init_logging(component: &str, format: LogFormat) -> LogGuard {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let layer = match format {
        LogFormat::Human => fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .init();

    tracing::debug!(component, "Logging initialized");

    LogGuard
}

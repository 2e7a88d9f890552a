//! Structured logging configuration.
//!
//! Logs go to stderr so that command output on stdout stays machine
//! readable. With JSON enabled, each entry is one JSON object:
//!
//! ```json
//! {"timestamp":"2026-01-15T10:30:00.000Z","level":"WARN","target":"geocat_domain::users","fields":{"message":"email address is shared by more than one user, using the first match","email":"a@b.com"}}
//! ```

use std::io;

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    util::TryInitError,
    EnvFilter,
};

use crate::config::{ConfigLoadError, LoggingSettings};

/// Configuration for structured logging.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Whether to use JSON format (true) or text format (false)
    pub json_format: bool,
    /// The default log level if RUST_LOG is not set
    pub default_level: Level,
    /// Whether to include span events (enter/exit)
    pub include_spans: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json_format: false,
            default_level: Level::INFO,
            include_spans: false,
        }
    }
}

impl LoggingConfig {
    pub fn json() -> Self {
        Self {
            json_format: true,
            ..Default::default()
        }
    }

    pub fn text() -> Self {
        Self {
            json_format: false,
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    pub fn with_spans(mut self) -> Self {
        self.include_spans = true;
        self
    }

    /// Builds the logging configuration from the `logging` config section.
    pub fn from_settings(settings: &LoggingSettings) -> Result<Self, ConfigLoadError> {
        let level = settings
            .level
            .to_lowercase()
            .parse::<Level>()
            .map_err(|_| ConfigLoadError::Invalid {
                message: format!("logging.level is not a log level: {}", settings.level),
            })?;
        let mut config = if settings.json {
            Self::json()
        } else {
            Self::text()
        };
        config.include_spans = settings.spans;
        Ok(config.with_level(level))
    }
}

/// Installs the global subscriber: an `EnvFilter` (from `RUST_LOG`, else
/// the configured level) in front of a stderr formatter.
///
/// Fails if a global subscriber is already set.
pub fn init_logging(config: LoggingConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_level.to_string()));

    let span_events = if config.include_spans {
        FmtSpan::ENTER | FmtSpan::EXIT
    } else {
        FmtSpan::NONE
    };

    let output = fmt::layer()
        .with_writer(io::stderr)
        .with_span_events(span_events)
        .with_target(true);
    let output = if config.json_format {
        output
            .json()
            .with_current_span(true)
            .with_file(false)
            .with_line_number(false)
            .boxed()
    } else {
        output.pretty().boxed()
    };

    tracing_subscriber::registry()
        .with(output)
        .with(filter)
        .try_init()
}

/// JSON subscriber writing to `writer`, for capturing log output in tests.
pub fn create_json_layer<W>(writer: W) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'writer> tracing_subscriber::fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(EnvFilter::new("trace"))
        .with(
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(true)
                .with_current_span(true),
        )
}

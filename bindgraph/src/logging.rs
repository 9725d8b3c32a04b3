//! Logging configuration for bindgraph.
//!
//! Structured `tracing` events are emitted from [`crate::executor`] and
//! [`crate::container`] whenever the `logging` feature is enabled (scheduled
//! op debug, swallowed-deinit warn, Ready/Destroyed info - SPEC_FULL.md
//! §2.1). This module only configures *where those events go*; it does not
//! emit any itself.
//!
//! # Example
//!
//! ```rust,ignore
//! use bindgraph::logging;
//!
//! logging::init();
//!
//! logging::builder()
//!     .with_level(tracing::Level::DEBUG)
//!     .pretty()
//!     .init();
//! ```

use tracing::Level;

/// Logging format configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON structured logging (production default).
    #[default]
    Json,
    /// Pretty colorful output (development).
    Pretty,
    /// Compact single-line output.
    Compact,
}

/// Builder for logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    target: Option<&'static str>,
    with_file: bool,
    with_line_number: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Json,
            target: None,
            with_file: false,
            with_line_number: false,
        }
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_target_filter(mut self, target: &'static str) -> Self {
        self.target = Some(target);
        self
    }

    /// Only show `bindgraph` crate events.
    pub fn bindgraph_only(self) -> Self {
        self.with_target_filter("bindgraph")
    }

    pub fn with_file(mut self) -> Self {
        self.with_file = true;
        self
    }

    pub fn with_line_number(mut self) -> Self {
        self.with_line_number = true;
        self
    }

    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// Installs a global `tracing_subscriber` with the configured settings.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        let filter = if let Some(target) = self.target {
            EnvFilter::new(format!("{}={}", target, self.level))
        } else {
            EnvFilter::new(self.level.to_string())
        };

        match self.format {
            LogFormat::Json => {
                #[cfg(feature = "logging-json")]
                {
                    let subscriber = fmt::layer()
                        .json()
                        .with_file(self.with_file)
                        .with_line_number(self.with_line_number)
                        .with_target(true);
                    tracing_subscriber::registry().with(filter).with(subscriber).init();
                }
                #[cfg(not(feature = "logging-json"))]
                {
                    let subscriber = fmt::layer()
                        .with_file(self.with_file)
                        .with_line_number(self.with_line_number)
                        .with_target(true);
                    tracing_subscriber::registry().with(filter).with(subscriber).init();
                }
            }
            LogFormat::Pretty => {
                let subscriber = fmt::layer()
                    .pretty()
                    .with_file(self.with_file)
                    .with_line_number(self.with_line_number)
                    .with_target(true);
                tracing_subscriber::registry().with(filter).with(subscriber).init();
            }
            LogFormat::Compact => {
                let subscriber = fmt::layer()
                    .compact()
                    .with_file(self.with_file)
                    .with_line_number(self.with_line_number)
                    .with_target(true);
                tracing_subscriber::registry().with(filter).with(subscriber).init();
            }
        }
    }

    /// No-op unless `logging-json`/`logging-pretty` is enabled.
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) {}
}

pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Initializes logging with default settings: JSON if `logging-json` is
/// enabled, otherwise pretty if `logging-pretty` is enabled.
pub fn init() {
    #[cfg(feature = "logging-json")]
    {
        builder().json().init();
        return;
    }
    #[cfg(all(feature = "logging-pretty", not(feature = "logging-json")))]
    {
        builder().pretty().init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_to_json_debug() {
        let b = LoggingBuilder::default();
        assert_eq!(b.level, Level::DEBUG);
        assert_eq!(b.format, LogFormat::Json);
        assert!(b.target.is_none());
    }

    #[test]
    fn builder_chain_applies_settings() {
        let b = LoggingBuilder::new()
            .with_level(Level::TRACE)
            .pretty()
            .with_file()
            .with_line_number()
            .bindgraph_only();

        assert_eq!(b.level, Level::TRACE);
        assert_eq!(b.format, LogFormat::Pretty);
        assert!(b.with_file);
        assert!(b.with_line_number);
        assert_eq!(b.target, Some("bindgraph"));
    }
}

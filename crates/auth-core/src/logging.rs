//! Tracing subscriber setup for services embedding auth-core
//!
//! `RUST_LOG`, when set, replaces the default filter entirely. Otherwise only
//! the Agora crates log at the configured level and everything else at `warn`.

use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};
use crate::error::{AuthError, Result};

/// Crates whose events pass the default filter at the configured level
pub const DEFAULT_TARGETS: &[&str] = &["agora_auth_core", "agora_users_core"];

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level for [`DEFAULT_TARGETS`] and any added targets
    pub level: Level,
    /// Emit one JSON object per event
    pub json: bool,
    pub file_info: bool,
    /// Log span enter/exit
    pub log_spans: bool,
    targets: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

impl LoggingConfig {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            json: false,
            file_info: false,
            log_spans: false,
            targets: DEFAULT_TARGETS.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Also log the embedding service's own crate at `level`.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.targets.push(target.into());
        self
    }

    pub fn with_json(mut self) -> Self {
        self.json = true;
        self
    }

    pub fn with_file_info(mut self) -> Self {
        self.file_info = true;
        self
    }

    pub fn with_spans(mut self) -> Self {
        self.log_spans = true;
        self
    }

    /// Filter used when `RUST_LOG` is unset, e.g. `warn,agora_auth_core=info`.
    pub fn default_directives(&self) -> String {
        let level = self.level.as_str().to_ascii_lowercase();
        let mut directives = String::from("warn");
        for target in &self.targets {
            directives.push_str(&format!(",{}={}", target, level));
        }
        directives
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(self.default_directives())
                .map_err(|e| AuthError::Config(format!("Invalid log filter: {}", e))),
        }
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn setup_logging(config: &LoggingConfig) -> Result<()> {
    let span_events = if config.log_spans {
        FmtSpan::ACTIVE
    } else {
        FmtSpan::NONE
    };

    let builder = fmt::Subscriber::builder()
        .with_env_filter(config.env_filter()?)
        .with_span_events(span_events)
        .with_file(config.file_info)
        .with_line_number(config.file_info);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| AuthError::Config(format!("Failed to install subscriber: {}", e)))?;

    tracing::info!(level = %config.level, json = config.json, "Logging initialised");
    Ok(())
}

pub fn parse_log_level(level: &str) -> Result<Level> {
    Level::from_str(level).map_err(|_| AuthError::Config(format!("Invalid log level: {}", level)))
}

// Logging setup for applications embedding the client
//
// The library itself only emits `tracing` events; installing a subscriber
// is left to the caller.

use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Extra `EnvFilter` directives, e.g. `"reqwest=warn"`
    pub directives: Vec<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Plain,
            directives: Vec::new(),
        }
    }
}

impl LogConfig {
    pub fn builder() -> LogConfigBuilder {
        LogConfigBuilder::default()
    }

    fn filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::new(format!("ably_rest={}", self.level.as_str()));
        for directive in &self.directives {
            if let Ok(parsed) = directive.parse() {
                filter = filter.add_directive(parsed);
            }
        }
        filter
    }
}

#[derive(Default)]
pub struct LogConfigBuilder {
    config: LogConfig,
}

impl LogConfigBuilder {
    pub fn level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.config.directives.push(directive.into());
        self
    }

    pub fn build(self) -> LogConfig {
        self.config
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Plain,
    Json,
}

/// Install a global fmt subscriber.
///
/// Returns `false` when a subscriber was already installed.
pub fn init_logging(config: LogConfig) -> bool {
    let builder = tracing_subscriber::fmt().with_env_filter(config.filter());

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init().is_ok(),
        LogFormat::Plain => builder.try_init().is_ok(),
    };

    if installed {
        tracing::debug!(level = ?config.level, format = ?config.format, "logging initialized");
    }
    installed
}

/// Mask the secret half of an API key
pub fn redact_key(key: &str) -> String {
    match key.split_once(':') {
        Some((name, _)) => format!("{}:[REDACTED]", name),
        None => "[REDACTED]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_key() {
        assert_eq!(redact_key("app.key:secret"), "app.key:[REDACTED]");
        assert_eq!(redact_key("opaque"), "[REDACTED]");
    }

    #[test]
    fn test_second_init_is_harmless() {
        let config = LogConfig::builder()
            .level(LogLevel::Debug)
            .directive("reqwest=warn")
            .build();

        init_logging(config.clone());
        assert!(!init_logging(config));
    }
}

//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber from configuration
//! - Map configured level names to tracing level filters
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Console provider is on by default; JSON provider only when configured
//! - Each provider has its own level; `Logging.LogLevel` is the fallback

use std::str::FromStr;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::Configuration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Information,
    Warning,
    Error,
    Critical,
    None,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Information => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error | LogLevel::Critical => LevelFilter::ERROR,
            LogLevel::None => LevelFilter::OFF,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "information" | "info" => Ok(LogLevel::Information),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            "critical" | "fatal" => Ok(LogLevel::Critical),
            "none" | "off" => Ok(LogLevel::None),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// Levels for the default and per-provider sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub default_level: LogLevel,
    pub console: Option<LogLevel>,
    pub json: Option<LogLevel>,
    pub json_enabled: bool,
    /// Level settings that could not be parsed, as `(key, value)`.
    pub rejected: Vec<(String, String)>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            default_level: LogLevel::Information,
            console: None,
            json: None,
            json_enabled: false,
            rejected: Vec::new(),
        }
    }
}

impl LoggingSettings {
    /// Read `Logging.LogLevel` (or `Logging.LogLevel.Default`) and
    /// `Logging.Console.LogLevel` / `Logging.Json.LogLevel`. Unknown names
    /// are collected in `rejected` and ignored.
    pub fn from_configuration(config: &Configuration) -> Self {
        let mut settings = Self::default();
        if let Some(level) = settings.read_level(config, "Logging.LogLevel") {
            settings.default_level = level;
        }
        settings.console = settings.read_level(config, "Logging.Console.LogLevel");
        settings.json = settings.read_level(config, "Logging.Json.LogLevel");
        settings.json_enabled = config.contains("Logging.Json");
        settings
    }

    fn read_level(&mut self, config: &Configuration, key: &str) -> Option<LogLevel> {
        let raw = config
            .get_str(key)
            .or_else(|| config.get_str(&format!("{key}.Default")))?;
        match raw.parse() {
            Ok(level) => Some(level),
            Err(_) => {
                self.rejected.push((key.to_string(), raw.to_string()));
                None
            }
        }
    }

    pub fn console_level(&self) -> LogLevel {
        self.console.unwrap_or(self.default_level)
    }

    /// `None` when the JSON provider is not configured.
    pub fn json_level(&self) -> Option<LogLevel> {
        self.json_enabled
            .then(|| self.json.unwrap_or(self.default_level))
    }
}

/// Install the global subscriber. `RUST_LOG`, when set, filters all sinks.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env().ok();

    let console = match settings.console_level() {
        LogLevel::None => None,
        level => Some(fmt::layer().with_filter(level.to_level_filter())),
    };
    let json = settings
        .json_level()
        .filter(|level| *level != LogLevel::None)
        .map(|level| fmt::layer().json().with_filter(level.to_level_filter()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(json)
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_level_names_and_aliases() {
        assert_eq!("Information".parse::<LogLevel>(), Ok(LogLevel::Information));
        assert_eq!("warn".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!("NONE".parse::<LogLevel>(), Ok(LogLevel::None));
        assert!("verbose".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Critical.to_level_filter(), LevelFilter::ERROR);
        assert_eq!(LogLevel::None.to_level_filter(), LevelFilter::OFF);
    }

    #[test]
    fn test_provider_levels_fall_back_to_default() {
        let config = Configuration::new(json!({
            "Logging": {
                "LogLevel": { "Default": "Debug" },
                "Json": { "LogLevel": "Error" }
            }
        }));
        let settings = LoggingSettings::from_configuration(&config);

        assert_eq!(settings.default_level, LogLevel::Debug);
        assert_eq!(settings.console_level(), LogLevel::Debug);
        assert_eq!(settings.json_level(), Some(LogLevel::Error));
    }

    #[test]
    fn test_unknown_level_is_rejected_and_ignored() {
        let config = Configuration::new(json!({
            "Logging": {
                "LogLevel": "Verbose",
                "Console": { "LogLevel": "Warning" }
            }
        }));
        let settings = LoggingSettings::from_configuration(&config);

        assert_eq!(settings.default_level, LogLevel::Information);
        assert_eq!(settings.console_level(), LogLevel::Warning);
        assert_eq!(
            settings.rejected,
            vec![("Logging.LogLevel".to_string(), "Verbose".to_string())]
        );
    }

    #[test]
    fn test_json_disabled_unless_configured() {
        let settings = LoggingSettings::from_configuration(&Configuration::empty());
        assert_eq!(settings.console_level(), LogLevel::Information);
        assert_eq!(settings.json_level(), None);
        assert!(settings.rejected.is_empty());
    }
}

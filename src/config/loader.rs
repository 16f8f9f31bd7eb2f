//! Configuration loading.
//!
//! # Layering (later wins)
//! ```text
//! defaults
//!     → appsettings.{json,toml}
//!     → appsettings.{environment}.{json,toml}
//!     → {prefix}* environment variables   (`__` or `:` nests)
//!     → key=value command-line arguments
//! ```

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::config::configuration::Configuration;
use crate::config::validation::ValidationError;

/// Default prefix for environment variables.
pub const ENV_PREFIX: &str = "REST_";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Json(serde_json::Error),
    InvalidArgument(String),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Toml(e) => write!(f, "Parse error: {}", e),
            ConfigError::Json(e) => write!(f, "Parse error: {}", e),
            ConfigError::InvalidArgument(arg) => {
                write!(f, "Invalid argument: '{}' it must follow key=value format", arg)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Toml(e) => Some(e),
            ConfigError::Json(e) => Some(e),
            ConfigError::InvalidArgument(_) | ConfigError::Validation(_) => None,
        }
    }
}

/// Accumulates configuration layers into a [`Configuration`].
#[derive(Debug, Clone, Default)]
pub struct ConfigurationBuilder {
    config: Configuration,
}

impl ConfigurationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge an in-memory JSON object.
    pub fn add_json(&mut self, value: Value) -> &mut Self {
        self.config.merge(value);
        self
    }

    pub fn add_json_str(&mut self, json: &str) -> Result<&mut Self, ConfigError> {
        let value: Value = serde_json::from_str(json).map_err(ConfigError::Json)?;
        Ok(self.add_json(value))
    }

    /// Merge a `.json` or `.toml` file (by extension; anything else is read as JSON).
    pub fn add_file(&mut self, path: &Path, optional: bool) -> Result<&mut Self, ConfigError> {
        if optional && !path.exists() {
            return Ok(self);
        }

        let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
        let value = if path.extension().is_some_and(|ext| ext == "toml") {
            let table: toml::Value = toml::from_str(&content).map_err(ConfigError::Toml)?;
            serde_json::to_value(table).map_err(ConfigError::Json)?
        } else {
            serde_json::from_str(&content).map_err(ConfigError::Json)?
        };

        tracing::debug!(path = %path.display(), "Configuration file loaded");
        Ok(self.add_json(value))
    }

    /// Merge the optional `appsettings` files found under `content_root`.
    pub fn add_app_settings(
        &mut self,
        content_root: &Path,
        environment: &str,
    ) -> Result<&mut Self, ConfigError> {
        for name in [
            "appsettings.json".to_string(),
            "appsettings.toml".to_string(),
            format!("appsettings.{environment}.json"),
            format!("appsettings.{environment}.toml"),
        ] {
            self.add_file(&content_root.join(name), true)?;
        }
        Ok(self)
    }

    /// Merge the process environment variables starting with `prefix`.
    pub fn add_env_vars(&mut self, prefix: &str) -> &mut Self {
        self.add_env_pairs(prefix, std::env::vars())
    }

    /// Merge `(name, value)` pairs starting with `prefix`; the prefix is stripped.
    pub fn add_env_pairs<I>(&mut self, prefix: &str, vars: I) -> &mut Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            if let Some(key) = name.strip_prefix(prefix).filter(|key| !key.is_empty()) {
                self.config.set(&key.replace("__", ":"), parse_scalar(&value));
            }
        }
        self
    }

    /// Merge `key=value` command-line arguments (leading dashes are ignored).
    pub fn add_cli_args<I, S>(&mut self, args: I) -> Result<&mut Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (key, value) in parse_cli_args(args)? {
            self.config.set(&key, parse_scalar(&value));
        }
        Ok(self)
    }

    pub fn set(&mut self, key: &str, value: Value) -> &mut Self {
        self.config.set(key, value);
        self
    }

    pub fn build(&self) -> Configuration {
        self.config.clone()
    }
}

/// Split `key=value` tokens. A token without `=`, or with an empty key or
/// value, is an error.
pub fn parse_cli_args<I, S>(args: I) -> Result<Vec<(String, String)>, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter()
        .map(|arg| {
            let arg = arg.as_ref();
            match arg.trim_start_matches('-').split_once('=') {
                Some((key, value)) if !key.is_empty() && !value.is_empty() => {
                    Ok((key.to_string(), value.to_string()))
                }
                _ => Err(ConfigError::InvalidArgument(arg.to_string())),
            }
        })
        .collect()
}

/// Interpret a raw string as JSON when it parses, else keep it as a string.
fn parse_scalar(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("rest-engine-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_layers_override_in_order() {
        let dir = temp_dir("layers");
        fs::write(
            dir.join("appsettings.json"),
            r#"{ "url": "http://localhost:8080", "Logging": { "LogLevel": "Information" } }"#,
        )
        .unwrap();
        fs::write(dir.join("appsettings.development.toml"), "timeoutSec = 10\n[Logging]\nLogLevel = \"Debug\"\n").unwrap();

        let mut builder = ConfigurationBuilder::new();
        builder
            .add_json(json!({ "timeoutSec": 30, "threadsNumber": 1 }))
            .add_app_settings(&dir, "development")
            .unwrap()
            .add_env_pairs(
                "REST_",
                vec![
                    ("REST_THREADSNUMBER".to_string(), "4".to_string()),
                    ("REST_Logging__Console__LogLevel".to_string(), "Warning".to_string()),
                    ("OTHER_VAR".to_string(), "ignored".to_string()),
                ],
            )
            .add_cli_args(["url=http://0.0.0.0:9000"])
            .unwrap();
        let config = builder.build();

        assert_eq!(config.get_u64("timeoutSec"), Some(10));
        assert_eq!(config.get_u64("threadsNumber"), Some(4));
        assert_eq!(config.get_str("Logging.LogLevel"), Some("Debug"));
        assert_eq!(config.get_str("Logging.Console.LogLevel"), Some("Warning"));
        assert_eq!(config.get_str("url"), Some("http://0.0.0.0:9000"));
        assert!(config.get("OTHER_VAR").is_none());

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_missing_optional_file_skipped() {
        let mut builder = ConfigurationBuilder::new();
        assert!(builder
            .add_file(Path::new("/nonexistent/appsettings.json"), true)
            .is_ok());
        assert!(matches!(
            builder.add_file(Path::new("/nonexistent/appsettings.json"), false),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = temp_dir("malformed");
        let path = dir.join("appsettings.json");
        fs::write(&path, "{ not json").unwrap();

        let err = ConfigurationBuilder::new().add_file(&path, true).unwrap_err();
        assert!(err.to_string().starts_with("Parse error"));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_cli_args() {
        let pairs = parse_cli_args(["--ENVIRONMENT=dev", "Logging:LogLevel=Trace"]).unwrap();
        assert_eq!(pairs[0], ("ENVIRONMENT".to_string(), "dev".to_string()));
        assert_eq!(pairs[1].0, "Logging:LogLevel");

        assert!(matches!(parse_cli_args(["novalue"]), Err(ConfigError::InvalidArgument(_))));
        assert!(matches!(parse_cli_args(["key="]), Err(ConfigError::InvalidArgument(_))));
    }

    #[test]
    fn test_scalar_parsing() {
        let mut builder = ConfigurationBuilder::new();
        builder.add_cli_args(["n=12", "flag=true", "name=api", "list=[1,2]"]).unwrap();
        let config = builder.build();

        assert_eq!(config.get("n"), Some(&json!(12)));
        assert_eq!(config.get("flag"), Some(&json!(true)));
        assert_eq!(config.get("name"), Some(&json!("api")));
        assert_eq!(config.get("list"), Some(&json!([1, 2])));
    }
}

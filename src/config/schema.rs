//! Configuration schema definitions.
//!
//! Server settings read from the configuration tree and the description of
//! the hosting environment.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::configuration::Configuration;
use crate::config::loader::{ConfigError, ENV_PREFIX};

pub const DEFAULT_URL: &str = "http://localhost:9090";

/// Transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerSettings {
    /// Listen URLs (`http://host:port`, `https://host:port`).
    pub urls: Vec<String>,

    /// Worker threads. 0 means available parallelism.
    pub threads_number: u16,

    /// Per-request timeout in seconds.
    pub timeout_sec: u64,

    /// Maximum request body size in bytes.
    pub body_limit: usize,

    /// How long in-flight requests may drain after a graceful shutdown signal.
    pub shutdown_grace_sec: u64,

    /// Certificate and key for `https://` URLs.
    pub tls: Option<TlsSettings>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            threads_number: 0,
            timeout_sec: 30,
            body_limit: 30 * 1024 * 1024,
            shutdown_grace_sec: 10,
            tls: None,
        }
    }
}

/// TLS configuration for `https://` listeners.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsSettings {
    /// Path to certificate file (PEM).
    pub cert_path: PathBuf,

    /// Path to private key file (PEM).
    pub key_path: PathBuf,
}

impl ServerSettings {
    /// Read settings from the configuration tree. Absent keys keep defaults.
    pub fn from_configuration(config: &Configuration) -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Some(urls) = config.get("urls").or_else(|| config.get("url")) {
            settings.urls = match urls {
                serde_json::Value::Array(_) => {
                    serde_json::from_value(urls.clone()).map_err(ConfigError::Json)?
                }
                _ => serde_json::from_value::<String>(urls.clone())
                    .map_err(ConfigError::Json)?
                    .split(';')
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .map(str::to_string)
                    .collect(),
            };
        }
        if let Some(threads) = config.get_u64("threadsNumber") {
            settings.threads_number = u16::try_from(threads).unwrap_or(u16::MAX);
        }
        if let Some(timeout) = config.get_u64("timeoutSec") {
            settings.timeout_sec = timeout;
        }
        if let Some(limit) = config.get_u64("bodyLimit") {
            settings.body_limit = usize::try_from(limit).unwrap_or(usize::MAX);
        }
        if let Some(grace) = config.get_u64("shutdownGraceSec") {
            settings.shutdown_grace_sec = grace;
        }
        if let Some(tls) = config.get_as::<TlsSettings>("tls").map_err(ConfigError::Json)? {
            settings.tls = Some(tls);
        }

        Ok(settings)
    }

    /// Fill unset values: the default URL and the available parallelism.
    pub fn resolved(mut self) -> Self {
        if self.urls.is_empty() {
            self.urls = vec![DEFAULT_URL.to_string()];
        }
        if self.threads_number == 0 {
            self.threads_number = std::thread::available_parallelism()
                .map(|n| u16::try_from(n.get()).unwrap_or(u16::MAX))
                .unwrap_or(1);
        }
        self
    }
}

/// Names of environment settings, also accepted as `NAME=value` CLI arguments.
pub mod environment_keys {
    pub const ENVIRONMENT_NAME: &str = "ENVIRONMENT";
    pub const APPLICATION_NAME: &str = "APPLICATION_NAME";
    pub const CONTENT_ROOT_PATH: &str = "CONTENT_ROOT_PATH";
    pub const WEB_ROOT_PATH: &str = "WEB_ROOT_PATH";
}

/// Hosting environment description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Environment {
    pub environment_name: String,
    pub application_name: String,
    pub content_root_path: PathBuf,
    pub web_root_path: PathBuf,
}

impl Default for Environment {
    fn default() -> Self {
        let content_root_path = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            environment_name: "production".to_string(),
            application_name: env!("CARGO_PKG_NAME").to_string(),
            web_root_path: content_root_path.join("wwwroot"),
            content_root_path,
        }
    }
}

impl Environment {
    pub fn is_environment(&self, name: &str) -> bool {
        self.environment_name.eq_ignore_ascii_case(name)
    }

    pub fn is_development(&self) -> bool {
        self.is_environment("development")
    }

    pub fn is_staging(&self) -> bool {
        self.is_environment("staging")
    }

    pub fn is_production(&self) -> bool {
        self.is_environment("production")
    }
}

/// Explicit environment choices; each one beats variables and arguments.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentOptions {
    pub prefix: Option<String>,
    pub environment_name: Option<String>,
    pub application_name: Option<String>,
    pub content_root_path: Option<PathBuf>,
    pub web_root_path: Option<PathBuf>,
}

impl EnvironmentOptions {
    pub fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or(ENV_PREFIX)
    }
}

/// Resolve the environment from variables, then `KEY=value` arguments, then
/// explicit options (later wins).
pub fn build_environment<V>(
    options: &EnvironmentOptions,
    vars: V,
    cli: &[(String, String)],
) -> Environment
where
    V: IntoIterator<Item = (String, String)>,
{
    use environment_keys::*;

    let mut env = Environment::default();
    let mut web_root_set = false;
    let prefix = options.prefix();

    let mut apply = |env: &mut Environment, key: &str, value: &str| match key {
        ENVIRONMENT_NAME => env.environment_name = value.to_string(),
        APPLICATION_NAME => env.application_name = value.to_string(),
        CONTENT_ROOT_PATH => env.content_root_path = PathBuf::from(value),
        WEB_ROOT_PATH => {
            env.web_root_path = PathBuf::from(value);
            web_root_set = true;
        }
        _ => {}
    };

    for (name, value) in vars {
        if let Some(key) = name.strip_prefix(prefix) {
            apply(&mut env, key, &value);
        }
    }
    for (key, value) in cli {
        apply(&mut env, key, value);
    }
    if let Some(name) = &options.environment_name {
        apply(&mut env, ENVIRONMENT_NAME, name);
    }
    if let Some(name) = &options.application_name {
        apply(&mut env, APPLICATION_NAME, name);
    }
    if let Some(path) = &options.content_root_path {
        env.content_root_path = path.clone();
    }
    if let Some(path) = &options.web_root_path {
        env.web_root_path = path.clone();
        web_root_set = true;
    }

    if !web_root_set {
        env.web_root_path = default_web_root(&env.content_root_path);
    }
    env
}

fn default_web_root(content_root: &Path) -> PathBuf {
    content_root.join("wwwroot")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let settings = ServerSettings::default();
        assert_eq!(settings.timeout_sec, 30);
        assert_eq!(settings.body_limit, 31_457_280);
        assert!(settings.urls.is_empty());

        let resolved = settings.resolved();
        assert_eq!(resolved.urls, vec![DEFAULT_URL.to_string()]);
        assert!(resolved.threads_number >= 1);
    }

    #[test]
    fn test_from_configuration() {
        let config = Configuration::new(json!({
            "url": "http://localhost:8080;https://localhost:8443",
            "threadsNumber": "3",
            "timeoutSec": 5,
            "tls": { "certPath": "cert.pem", "keyPath": "key.pem" }
        }));
        let settings = ServerSettings::from_configuration(&config).unwrap();

        assert_eq!(settings.urls, vec!["http://localhost:8080", "https://localhost:8443"]);
        assert_eq!(settings.threads_number, 3);
        assert_eq!(settings.timeout_sec, 5);
        assert_eq!(settings.tls.unwrap().cert_path, PathBuf::from("cert.pem"));
    }

    #[test]
    fn test_urls_array() {
        let config = Configuration::new(json!({ "urls": ["http://a:1", "http://b:2"] }));
        let settings = ServerSettings::from_configuration(&config).unwrap();
        assert_eq!(settings.urls.len(), 2);

        let bad = Configuration::new(json!({ "urls": 5 }));
        assert!(ServerSettings::from_configuration(&bad).is_err());
    }

    #[test]
    fn test_environment_precedence() {
        let vars = vec![
            ("REST_ENVIRONMENT".to_string(), "staging".to_string()),
            ("REST_APPLICATION_NAME".to_string(), "from-env".to_string()),
            ("REST_CONTENT_ROOT_PATH".to_string(), "/srv/app".to_string()),
        ];
        let cli = vec![("ENVIRONMENT".to_string(), "development".to_string())];
        let options = EnvironmentOptions {
            application_name: Some("explicit".to_string()),
            ..Default::default()
        };

        let env = build_environment(&options, vars, &cli);
        assert!(env.is_development());
        assert_eq!(env.application_name, "explicit");
        assert_eq!(env.content_root_path, PathBuf::from("/srv/app"));
        assert_eq!(env.web_root_path, PathBuf::from("/srv/app/wwwroot"));
    }

    #[test]
    fn test_environment_default_is_production() {
        let env = build_environment(&EnvironmentOptions::default(), Vec::new(), &[]);
        assert!(env.is_production());
    }
}

//! Layered configuration tree.
//!
//! A JSON object tree addressed with `.` or `:` separated keys
//! (`Logging.LogLevel`, `Logging:Console:LogLevel`). Key matching is
//! case-insensitive; an exact match wins when both spellings exist.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    root: Value,
}

impl Configuration {
    pub fn new(root: Value) -> Self {
        match root {
            Value::Object(_) => Self { root },
            _ => Self::empty(),
        }
    }

    pub fn empty() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        split_key(key).try_fold(&self.root, |node, part| find_ci(node.as_object()?, part))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }

    /// Numeric value, accepting numeric strings.
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match self.get(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Deserialize the value at `key`. `Ok(None)` when the key is absent.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, serde_json::Error> {
        self.get(key)
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
    }

    /// Sub-tree at `key`; empty when absent or not an object.
    pub fn section(&self, key: &str) -> Configuration {
        self.get(key)
            .cloned()
            .map(Configuration::new)
            .unwrap_or_else(Configuration::empty)
    }

    /// Set `key`, creating intermediate objects and replacing non-objects on the way.
    pub fn set(&mut self, key: &str, value: Value) {
        let parts: Vec<&str> = split_key(key).collect();
        if let Value::Object(root) = &mut self.root {
            set_path(root, &parts, value);
        }
    }

    /// Deep-merge `other` into this tree; `other` wins on conflicts.
    pub fn merge(&mut self, other: Value) {
        merge_values(&mut self.root, other);
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::empty()
    }
}

fn split_key(key: &str) -> impl Iterator<Item = &str> {
    key.split([':', '.']).filter(|part| !part.is_empty())
}

fn find_ci<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).or_else(|| {
        map.iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    })
}

fn existing_key(map: &Map<String, Value>, key: &str) -> Option<String> {
    if map.contains_key(key) {
        return Some(key.to_string());
    }
    map.keys().find(|name| name.eq_ignore_ascii_case(key)).cloned()
}

fn set_path(map: &mut Map<String, Value>, parts: &[&str], value: Value) {
    let Some((first, rest)) = parts.split_first() else {
        return;
    };
    let name = existing_key(map, first).unwrap_or_else(|| first.to_string());
    if rest.is_empty() {
        map.insert(name, value);
        return;
    }

    let child = map.entry(name).or_insert_with(|| Value::Object(Map::new()));
    if !child.is_object() {
        *child = Value::Object(Map::new());
    }
    if let Value::Object(child) = child {
        set_path(child, rest, value);
    }
}

fn merge_values(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                let name = existing_key(target, &key).unwrap_or(key);
                match target.get_mut(&name) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        target.insert(name, value);
                    }
                }
            }
        }
        (target, source) => *target = source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_lookup_with_either_separator() {
        let config = Configuration::new(json!({
            "Logging": { "LogLevel": "Debug", "Console": { "LogLevel": "Warning" } },
            "threadsNumber": 4
        }));

        assert_eq!(config.get_str("Logging.LogLevel"), Some("Debug"));
        assert_eq!(config.get_str("Logging:Console:LogLevel"), Some("Warning"));
        assert_eq!(config.get_str("logging.loglevel"), Some("Debug"));
        assert_eq!(config.get_u64("threadsNumber"), Some(4));
        assert!(config.get("Logging.Json.LogLevel").is_none());
        assert_eq!(config.section("Logging").get_str("LogLevel"), Some("Debug"));
    }

    #[test]
    fn test_deep_merge_later_wins() {
        let mut config = Configuration::new(json!({
            "Logging": { "LogLevel": "Information", "Json": { "LogLevel": "None" } },
            "url": "http://localhost:9090"
        }));
        config.merge(json!({ "logging": { "LogLevel": "Debug" }, "timeoutSec": 5 }));

        assert_eq!(config.get_str("Logging.LogLevel"), Some("Debug"));
        assert_eq!(config.get_str("Logging.Json.LogLevel"), Some("None"));
        assert_eq!(config.get_u64("timeoutSec"), Some(5));
        assert_eq!(config.get_str("url"), Some("http://localhost:9090"));
    }

    #[test]
    fn test_set_creates_path() {
        let mut config = Configuration::empty();
        config.set("tls:certPath", json!("cert.pem"));
        config.set("TLS.keyPath", json!("key.pem"));
        config.set("timeoutSec", json!(10));
        config.set("timeoutSec.inner", json!(1));

        assert_eq!(config.get_str("tls.certPath"), Some("cert.pem"));
        assert_eq!(config.get_str("tls.keyPath"), Some("key.pem"));
        assert_eq!(config.get_u64("timeoutSec.inner"), Some(1));
    }

    #[test]
    fn test_typed_reads() {
        let config = Configuration::new(json!({ "urls": ["http://a:1", "http://b:2"], "flag": "true" }));
        let urls: Vec<String> = config.get_as("urls").unwrap().unwrap();
        assert_eq!(urls.len(), 2);
        assert_eq!(config.get_bool("flag"), Some(true));
        assert!(config.get_as::<u32>("missing").unwrap().is_none());
        assert!(config.get_as::<u32>("urls").is_err());
    }
}

use crate::error::{ConfigError, Result};
use dashmap::DashMap;
use serde::Deserialize;
use std::env;
use std::sync::Arc;

pub const ERROR_PAGE: &str = "ERROR_PAGE";
pub const ERROR_XHR_ENABLED: &str = "ERROR_XHR_ENABLED";
pub const ERROR_DEFAULT_MSG: &str = "ERROR_DEFAULT_MSG";
pub const ERROR_FORCE_CONTENT_TYPE: &str = "ERROR_FORCE_CONTENT_TYPE";
pub const ERROR_CONTENT_TYPES: &str = "ERROR_CONTENT_TYPES";
pub const ERROR_DISPATCHER: &str = "ERROR_DISPATCHER";
pub const SERVER_NAME: &str = "SERVER_NAME";
pub const DEBUG: &str = "DEBUG";

const KNOWN_KEYS: [&str; 8] = [
    ERROR_PAGE,
    ERROR_XHR_ENABLED,
    ERROR_DEFAULT_MSG,
    ERROR_FORCE_CONTENT_TYPE,
    ERROR_CONTENT_TYPES,
    ERROR_DISPATCHER,
    SERVER_NAME,
    DEBUG,
];

/// Raw string configuration with declare-default-if-absent semantics.
///
/// This is only the loading surface; handlers read the typed
/// [`ErrorsConfig`] produced by [`ErrorsConfig::from_store`].
#[derive(Clone, Default)]
pub struct ConfigStore {
    config: Arc<DashMap<String, String>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every recognized key present in the process environment.
    pub fn from_env() -> Self {
        let store = Self::default();
        for key in KNOWN_KEYS {
            if let Ok(value) = env::var(key) {
                store.set(key, &value);
            }
        }
        store
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }

    /// Store `value` under `key` unless the key is already present, and
    /// return whatever ends up stored.
    pub fn set_default(&self, key: &str, value: &str) -> String {
        self.config
            .entry(key.to_string())
            .or_insert_with(|| value.to_string())
            .clone()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.config.contains_key(key)
    }
}

/// Immutable error-handling configuration, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ErrorsConfig {
    /// Template rendered by the web handler; `None` disables templating.
    pub error_page: Option<String>,
    /// Route AJAX requests hitting a web handler to the JSON handler.
    pub xhr_enabled: bool,
    /// Detail used for unrecognized failures outside debug mode.
    pub default_message: String,
    /// Rewrite outgoing content types to carry the problem marker.
    pub force_content_type: bool,
    /// Content-type families eligible for that rewrite.
    pub content_types: Vec<String>,
    /// Dispatcher name for unmatched-route errors.
    pub dispatcher: Option<String>,
    /// Base host used by the subdomain dispatcher.
    pub server_name: Option<String>,
    pub debug: bool,
}

impl Default for ErrorsConfig {
    fn default() -> Self {
        Self {
            error_page: Some("error.html".to_string()),
            xhr_enabled: true,
            default_message: "Unhandled Exception".to_string(),
            force_content_type: true,
            content_types: vec!["json".to_string(), "xml".to_string()],
            dispatcher: None,
            server_name: None,
            debug: false,
        }
    }
}

impl ErrorsConfig {
    /// Declare defaults on `store` for any missing key, then parse it.
    pub fn from_store(store: &ConfigStore) -> Result<Self> {
        let defaults = Self::default();

        let error_page =
            store.set_default(ERROR_PAGE, defaults.error_page.as_deref().unwrap_or(""));
        let xhr_enabled = store.set_default(ERROR_XHR_ENABLED, "true");
        let default_message = store.set_default(ERROR_DEFAULT_MSG, &defaults.default_message);
        let force_content_type = store.set_default(ERROR_FORCE_CONTENT_TYPE, "true");
        let content_types =
            store.set_default(ERROR_CONTENT_TYPES, &defaults.content_types.join(","));
        let debug = store.set_default(DEBUG, "false");

        Ok(Self {
            error_page: non_empty(error_page),
            xhr_enabled: parse_bool(ERROR_XHR_ENABLED, &xhr_enabled)?,
            default_message,
            force_content_type: parse_bool(ERROR_FORCE_CONTENT_TYPE, &force_content_type)?,
            content_types: content_types
                .split(',')
                .map(str::trim)
                .filter(|family| !family.is_empty())
                .map(str::to_string)
                .collect(),
            dispatcher: store.get(ERROR_DISPATCHER).and_then(non_empty),
            server_name: store.get(SERVER_NAME).and_then(non_empty),
            debug: parse_bool(DEBUG, &debug)?,
        })
    }

    pub fn with_error_page(mut self, page: Option<&str>) -> Self {
        self.error_page = page.map(str::to_string);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_xhr_enabled(mut self, enabled: bool) -> Self {
        self.xhr_enabled = enabled;
        self
    }

    pub fn with_default_message(mut self, message: impl Into<String>) -> Self {
        self.default_message = message.into();
        self
    }

    pub fn with_force_content_type(mut self, force: bool) -> Self {
        self.force_content_type = force;
        self
    }

    pub fn with_content_types<I, S>(mut self, families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.content_types = families.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_dispatcher(mut self, name: impl Into<String>) -> Self {
        self.dispatcher = Some(name.into());
        self
    }

    pub fn with_server_name(mut self, server_name: impl Into<String>) -> Self {
        self.server_name = Some(server_name.into());
        self
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid_value(key, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store_yields_defaults() {
        let store = ConfigStore::new();
        let config = ErrorsConfig::from_store(&store).unwrap();
        assert_eq!(config, ErrorsConfig::default());
        assert_eq!(store.get(ERROR_PAGE).as_deref(), Some("error.html"));
    }

    #[test]
    fn test_set_default_keeps_existing_value() {
        let store = ConfigStore::new();
        store.set(ERROR_DEFAULT_MSG, "Something broke");
        assert_eq!(store.set_default(ERROR_DEFAULT_MSG, "other"), "Something broke");
    }

    #[test]
    fn test_store_values_are_parsed() {
        let store = ConfigStore::new();
        store.set(ERROR_PAGE, "");
        store.set(ERROR_XHR_ENABLED, "off");
        store.set(ERROR_CONTENT_TYPES, "json, yaml ,");
        store.set(ERROR_DISPATCHER, "urlprefix");
        store.set(SERVER_NAME, "example.com");
        store.set(DEBUG, "1");

        let config = ErrorsConfig::from_store(&store).unwrap();
        assert_eq!(config.error_page, None);
        assert!(!config.xhr_enabled);
        assert_eq!(config.content_types, vec!["json", "yaml"]);
        assert_eq!(config.dispatcher.as_deref(), Some("urlprefix"));
        assert_eq!(config.server_name.as_deref(), Some("example.com"));
        assert!(config.debug);
    }

    #[test]
    fn test_invalid_bool_is_rejected() {
        let store = ConfigStore::new();
        store.set(DEBUG, "maybe");
        let err = ErrorsConfig::from_store(&store).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == DEBUG));
    }

    #[test]
    fn test_deserialize_fills_missing_fields() {
        let config: ErrorsConfig =
            serde_json::from_str(r#"{"debug": true, "error_page": null}"#).unwrap();
        assert!(config.debug);
        assert_eq!(config.error_page, None);
        assert_eq!(config.default_message, "Unhandled Exception");
    }
}

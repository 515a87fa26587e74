//! Configuration management for spa-csrf
//!
//! Sources are layered in the order they are loaded: later sources override
//! earlier ones key by key, so a typical startup loads a file and then the
//! environment.
//!
//! ```
//! use spa_csrf_config::{ConfigManager, FileFormat};
//!
//! let config = ConfigManager::with_prefix("SPA_CSRF");
//! config
//!     .load_str(r#"{"csrf": {"header": {"name": "X-XSRF-TOKEN"}}}"#, FileFormat::Json)
//!     .unwrap();
//!
//! let name: String = config.get("csrf.header.name").unwrap();
//! assert_eq!(name, "X-XSRF-TOKEN");
//! ```

pub mod env;
pub mod error;
pub mod loader;
pub mod validation;

pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use validation::{ConfigValidator, Validate};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Main configuration manager
#[derive(Clone)]
pub struct ConfigManager {
    config: Arc<RwLock<Value>>,
    env_prefix: Option<String>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(Value::Object(Map::new()))),
            env_prefix: None,
        }
    }

    /// Create with environment variable prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            config: Arc::new(RwLock::new(Value::Object(Map::new()))),
            env_prefix: Some(prefix.into()),
        }
    }

    /// Load configuration from environment variables
    pub fn load_env(&self) -> Result<()> {
        let loader = EnvLoader::new(self.env_prefix.clone());
        let value = loader.load()?;
        debug!(prefix = ?self.env_prefix, "Loaded configuration from environment");
        self.merge(value);
        Ok(())
    }

    /// Load a `.env` file into the process environment, then the environment
    pub fn load_dotenv(&self, path: Option<&str>) -> Result<()> {
        if let Some(path) = path {
            dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
        } else {
            dotenvy::dotenv().ok();
        }
        self.load_env()
    }

    /// Load configuration from file, format taken from the extension
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let loader = ConfigLoader::auto(path)?;
        let value = loader.load_file(path)?;
        debug!(path = %path.display(), "Loaded configuration file");
        self.merge(value);
        Ok(())
    }

    /// Load configuration from an in-memory document
    pub fn load_str(&self, content: &str, format: FileFormat) -> Result<()> {
        let value = ConfigLoader::new(format).parse(content)?;
        self.merge(value);
        Ok(())
    }

    /// Deep-merge a value into the current configuration
    pub fn merge(&self, value: Value) {
        let mut config = self.config.write();
        merge_values(&mut config, value);
    }

    /// Set a single dotted key
    pub fn set(&self, key: &str, value: Value) {
        let mut nested = value;
        for segment in key.split('.').rev() {
            let mut map = Map::new();
            map.insert(segment.to_string(), nested);
            nested = Value::Object(map);
        }
        self.merge(nested);
    }

    pub fn has(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Get a typed value by dotted key
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self
            .lookup(key)
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;

        serde_json::from_value(value)
            .map_err(|e| ConfigError::DeserializationError(format!("{}: {}", key, e)))
    }

    /// Get a typed value or a default
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Deserialize a whole section; a missing section deserializes from `{}`
    /// so that types with serde defaults still load.
    pub fn extract<T: DeserializeOwned>(&self, section: &str) -> Result<T> {
        let value = if section.is_empty() {
            self.config.read().clone()
        } else {
            self.lookup(section)
                .unwrap_or_else(|| Value::Object(Map::new()))
        };

        serde_json::from_value(value)
            .map_err(|e| ConfigError::DeserializationError(format!("{}: {}", section, e)))
    }

    fn lookup(&self, key: &str) -> Option<Value> {
        let config = self.config.read();
        let mut current = &*config;
        for segment in key.split('.') {
            current = current.get(segment)?;
        }
        Some(current.clone())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_values(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, source) => *target = source,
    }
}

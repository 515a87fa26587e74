// Environment variable loading

use crate::{ConfigError, Result};
use serde_json::{Map, Value};
use std::env;

/// Separator between nesting levels in variable names.
pub const NESTING_SEPARATOR: &str = "__";

/// Environment variable loader
///
/// With prefix `SPA_CSRF`, the variable `SPA_CSRF__COOKIE__SECURE=true` becomes
/// `{"cookie": {"secure": true}}`.
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Load the process environment as a nested value
    pub fn load(&self) -> Result<Value> {
        Ok(self.load_pairs(env::vars()))
    }

    /// Build a nested value from explicit `(name, value)` pairs
    pub fn load_pairs<I>(&self, vars: I) -> Value
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut root = Map::new();

        for (key, value) in vars {
            let Some(path) = self.strip_prefix(&key) else {
                continue;
            };

            let segments: Vec<String> = path
                .split(NESTING_SEPARATOR)
                .filter(|s| !s.is_empty())
                .map(|s| s.to_lowercase())
                .collect();

            if segments.is_empty() {
                continue;
            }

            insert_nested(&mut root, &segments, coerce(&value));
        }

        Value::Object(root)
    }

    fn strip_prefix<'a>(&self, key: &'a str) -> Option<&'a str> {
        match &self.prefix {
            Some(prefix) => key
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix('_'))
                .map(|rest| rest.trim_start_matches('_')),
            None => Some(key),
        }
    }

    /// Load a specific environment variable
    pub fn load_var(&self, key: &str) -> Result<String> {
        let full_key = match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix, key.to_uppercase()),
            None => key.to_uppercase(),
        };

        env::var(&full_key).map_err(ConfigError::EnvError)
    }

    /// Load with default value
    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

fn insert_nested(root: &mut Map<String, Value>, segments: &[String], value: Value) {
    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => return,
    };

    let mut current = root;
    for segment in parents {
        let entry = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = match entry {
            Value::Object(map) => map,
            _ => return,
        };
    }
    current.insert(last.clone(), value);
}

/// Environment values are strings; booleans and integers are recognised.
fn coerce(value: &str) -> Value {
    match value.to_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if let Ok(n) = value.parse::<i64>() {
        return Value::from(n);
    }

    Value::String(value.to_string())
}

//! Integration tests for spa-csrf-config

use spa_csrf_config::*;
use std::fs;
use std::path::PathBuf;

fn fixture(name: &str, content: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("spa-csrf-config-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_toml_file() {
    let path = fixture(
        "csrf.toml",
        r#"
        [csrf]
        token_id = "angular"

        [csrf.header]
        name = "X-XSRF-TOKEN"

        [[csrf.secure]]
        path = "^/api"
        methods = ["POST", "PUT"]
        "#,
    );

    let config = ConfigManager::new();
    config.load_file(&path).unwrap();

    assert_eq!(config.get::<String>("csrf.token_id").unwrap(), "angular");
    let secure: Vec<serde_json::Value> = config.get("csrf.secure").unwrap();
    assert_eq!(secure[0]["methods"][1], "PUT");
}

#[test]
fn test_file_then_overrides() {
    let path = fixture("csrf.json", r#"{"csrf": {"cookie": {"name": "XSRF-TOKEN", "secure": false}}}"#);

    let config = ConfigManager::new();
    config.load_file(&path).unwrap();

    let env = EnvLoader::new(Some("APP".to_string())).load_pairs(vec![(
        "APP__CSRF__COOKIE__SECURE".to_string(),
        "true".to_string(),
    )]);
    config.merge(env);

    assert!(config.get::<bool>("csrf.cookie.secure").unwrap());
    assert_eq!(config.get::<String>("csrf.cookie.name").unwrap(), "XSRF-TOKEN");
}

#[test]
fn test_missing_file() {
    let config = ConfigManager::new();
    let result = config.load_file("/definitely/not/here/csrf.toml");
    assert!(matches!(result, Err(ConfigError::LoadError(_))));
}

#[test]
fn test_unsupported_extension() {
    let path = fixture("csrf.yaml", "csrf: {}");
    let config = ConfigManager::new();
    assert!(matches!(config.load_file(&path), Err(ConfigError::LoadError(_))));
}

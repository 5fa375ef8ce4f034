//! Loading engine and step configuration from disk

use std::io::Write;

use taskchain::config::{EngineConfig, StepConfig, StepSpec};
use tempfile::NamedTempFile;

#[test]
fn test_engine_config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
default_timeout = "15m"

[features]
disable_helm_repo_cache = true

[driver]
max_transport_retries = 5
"#
    )
    .unwrap();

    let config = EngineConfig::from_file(file.path()).unwrap();

    assert_eq!(config.default_timeout, "15m");
    assert!(config.features.disable_helm_repo_cache);
    assert_eq!(config.driver.max_transport_retries, 5);
    assert_eq!(config.driver.retry_backoff_ms, 500);
}

#[test]
fn test_engine_config_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.toml");

    let err = EngineConfig::from_file(&path).unwrap_err();

    assert!(err.to_string().starts_with("Failed to read config file"));
}

#[test]
fn test_engine_config_bad_timeout_names_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "default_timeout = \"10 minutes\"").unwrap();

    let err = EngineConfig::from_file(file.path()).unwrap_err();

    assert!(err.to_string().starts_with("Failed to parse config file"));
    assert!(format!("{:#}", err).contains("Invalid timeout value"));
}

#[test]
fn test_serverless_step_from_yaml() {
    let step = StepConfig::from_yaml(
        r#"
identifier: sls
spec:
  type: serverless_deploy
  command_options: --force
"#,
    )
    .unwrap();

    assert_eq!(step.timeout, None);
    assert!(step.delegate_selectors.is_empty());
    match &step.spec {
        StepSpec::ServerlessDeploy { command_options } => {
            assert_eq!(command_options.as_deref(), Some("--force"));
        }
        other => panic!("unexpected spec {}", other.display_name()),
    }
    assert!(!step.spec.is_rollback());
}

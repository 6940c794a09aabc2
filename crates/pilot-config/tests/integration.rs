use std::fs;

use pilot_config::{ConfigError, ConfigLoader, LogFormatSetting};
use serde_json::json;

#[test]
fn document_values_are_layered_under_environment() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let path = temp.path().join("pilot.json");
    fs::write(
        &path,
        serde_json::to_vec(&json!({
            "rucio": { "client": "rucio-file", "timeout_secs": 45 },
            "workdir": "/scratch/job",
            "telemetry": { "level": "debug", "format": "pretty" }
        }))?,
    )?;

    let env = |name: &str| (name == "PILOT_RUCIO_CLIENT").then(|| "rucio-env".to_string());
    let config = ConfigLoader::new(Some(path)).with_env(env).load()?;

    assert_eq!(config.rucio.client, "rucio-env");
    assert_eq!(config.rucio.timeout_secs, Some(45));
    assert_eq!(
        config.workdir.as_deref(),
        Some(std::path::Path::new("/scratch/job"))
    );
    assert_eq!(config.telemetry.level, "debug");
    assert_eq!(config.telemetry.format, Some(LogFormatSetting::Pretty));
    assert_eq!(config.rucio.summary_file, "rucio_upload.json");
    Ok(())
}

#[test]
fn malformed_document_is_reported_as_json_error() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let path = temp.path().join("pilot.json");
    fs::write(&path, "{ not json")?;

    let err = ConfigLoader::new(Some(path))
        .with_env(|_: &str| -> Option<String> { None })
        .load()
        .unwrap_err();
    assert!(matches!(err, ConfigError::Json { .. }));
    Ok(())
}

#[test]
fn document_with_zero_timeout_fails_validation() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let path = temp.path().join("pilot.json");
    fs::write(&path, r#"{ "rucio": { "timeout_secs": 0 } }"#)?;

    let err = ConfigLoader::new(Some(path))
        .with_env(|_: &str| -> Option<String> { None })
        .load()
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidField {
            field: "timeout_secs",
            ..
        }
    ));
    Ok(())
}

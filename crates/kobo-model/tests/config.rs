//! Tests for loading config files from disk.

use std::fs;

use kobo_model::{ConfigError, GroupSource, load_config};

#[test]
fn loads_config_from_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{
            "parent_data_path": "data/parents.csv",
            "repeat_groups": {
                "household": {
                    "members": {"data_path": "data/members.csv", "fields": {"name": "Name"}}
                }
            },
            "api_endpoint": "https://kf.example.org/api/v1/submissions",
            "project_uuid": "aBc123",
            "formhub_uuid": "fh-1",
            "formhub_version": "vXyZ",
            "api_token_UNHCR_PROD": "token"
        }"#,
    )
    .expect("write config");

    let config = load_config(&path).expect("load config");
    assert_eq!(config.api_endpoint, "https://kf.example.org/api/v1/submissions");
    let meta = config.meta();
    assert_eq!(meta.project_uuid, "aBc123");
    assert_eq!(meta.formhub_uuid, "fh-1");
    assert_eq!(meta.form_version, "vXyZ");
    assert!(matches!(
        config.group_source().expect("group source"),
        GroupSource::Configured(groups) if groups.contains_key("household")
    ));
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = load_config(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("config.json");
    fs::write(&path, "{ not json").expect("write config");
    let err = load_config(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("config.json"));
}

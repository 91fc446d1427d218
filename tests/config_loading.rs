use std::io::Write;

use weft_core::config::AppConfig;
use weft_core::error::WeftError;

#[test]
fn test_load_full_config_from_file() {
    let toml_content = r#"
[spark]
app_id = "app-1"
api_key = "key-123456"
api_secret = "secret-abcdef"
api_url = "wss://spark-api.xf-yun.com/v4.0/chat"
domain = "4.0Ultra"
connect_timeout_secs = 10
response_timeout_secs = 90

[plugins]
aitools_url = "http://tools.internal:18668"
timeout_secs = 45
default_speed = 60

[workflows]
dir = "/srv/weft/workflows"
run_timeout_secs = 120
"#;

    let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
    tmp.write_all(toml_content.as_bytes()).expect("write toml");

    let config = AppConfig::load(tmp.path()).expect("load config");

    assert_eq!(config.spark.app_id, "app-1");
    assert_eq!(config.spark.domain, "4.0Ultra");
    assert_eq!(config.spark.api_url, "wss://spark-api.xf-yun.com/v4.0/chat");
    assert_eq!(config.spark.connect_timeout_secs, 10);
    assert_eq!(config.spark.response_timeout_secs, 90);
    assert_eq!(config.spark.uid, "workflow-user");
    assert!(config.spark.has_credentials());

    assert_eq!(config.plugins.aitools_url, "http://tools.internal:18668");
    assert_eq!(config.plugins.timeout_secs, 45);
    assert_eq!(config.plugins.default_speed, 60);

    assert_eq!(
        config.workflows_dir(),
        std::path::PathBuf::from("/srv/weft/workflows")
    );
    assert_eq!(config.workflows.run_timeout_secs, 120);

    let masked = config.masked();
    assert_eq!(masked.spark.api_key, "key-****");
    assert_eq!(masked.spark.api_secret, "secr****");
}

#[test]
fn test_empty_file_uses_defaults() {
    let tmp = tempfile::NamedTempFile::new().expect("create temp file");
    let config = AppConfig::load(tmp.path()).expect("load config");

    assert_eq!(config.spark.api_url, "wss://spark-api.xf-yun.com/v3.5/chat");
    assert_eq!(config.spark.domain, "generalv3.5");
    assert!(!config.spark.has_credentials());
    assert_eq!(config.plugins.default_speed, 50);
    assert_eq!(config.workflows.run_timeout_secs, 600);
}

#[test]
fn test_env_var_expansion_in_config() {
    std::env::set_var("WEFT_TEST_SPARK_SECRET", "expanded-secret");

    let toml_content = r#"
[spark]
api_key = "k"
api_secret = "${WEFT_TEST_SPARK_SECRET}"
app_id = "${WEFT_TEST_UNSET_VARIABLE}"
"#;

    let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
    tmp.write_all(toml_content.as_bytes()).expect("write toml");

    let config = AppConfig::load(tmp.path()).expect("load config");
    assert_eq!(config.spark.api_secret, "expanded-secret");
    assert_eq!(config.spark.app_id, "${WEFT_TEST_UNSET_VARIABLE}");

    std::env::remove_var("WEFT_TEST_SPARK_SECRET");
}

#[test]
fn test_missing_file_is_config_not_found() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let err = AppConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, WeftError::ConfigNotFound(_)));
}

#[test]
fn test_malformed_file_is_config_error() {
    let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
    tmp.write_all(b"[spark\napi_key = ").expect("write toml");

    let err = AppConfig::load(tmp.path()).unwrap_err();
    assert!(matches!(err, WeftError::Config(_)));
}

use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

use reviewtrail::azure::auth::resolve_token_with;
use reviewtrail::util::config::{AppConfig, MAX_LOOKBACK_DAYS};

fn load(toml: &str) -> AppConfig {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(toml.as_bytes()).unwrap();
    AppConfig::load(Some(f.path())).unwrap()
}

#[test]
fn test_load_full_config() {
    let config = load(
        r#"
[azure]
org_url = "https://dev.azure.com/contoso"
project = "Fabrikam"
repository = "web"
token = "secret"

[report]
lookback_days = 14
page_size = 100
output_dir = "/tmp/reports"
"#,
    );
    assert_eq!(
        config.azure.org_url.as_deref(),
        Some("https://dev.azure.com/contoso")
    );
    assert_eq!(config.azure.project.as_deref(), Some("Fabrikam"));
    assert_eq!(config.azure.repository.as_deref(), Some("web"));
    assert_eq!(config.azure.token.as_deref(), Some("secret"));
    assert_eq!(config.report.lookback_days, 14);
    assert_eq!(config.report.page_size, 100);
    assert_eq!(config.output_dir(), PathBuf::from("/tmp/reports"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_load_partial_config_uses_defaults() {
    let config = load(
        r#"
[azure]
project = "Fabrikam"
"#,
    );
    assert_eq!(config.azure.project.as_deref(), Some("Fabrikam"));
    assert!(config.azure.org_url.is_none());
    assert!(config.azure.token.is_none());
    assert_eq!(config.report.lookback_days, 32);
    assert_eq!(config.report.page_size, 500);
    assert_eq!(config.output_dir(), PathBuf::from("."));
}

#[test]
fn test_load_empty_config_uses_all_defaults() {
    let config = load("");
    assert!(config.azure.project.is_none());
    assert!(config.azure.repository.is_none());
    assert_eq!(config.report.lookback_days, 32);
    assert_eq!(config.report.page_size, 500);
}

#[test]
fn test_load_nonexistent_file_fails() {
    let result = AppConfig::load(Some(std::path::Path::new("/nonexistent/path/config.toml")));
    assert!(result.is_err());
}

#[test]
fn test_load_invalid_toml_fails() {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(b"this is not [valid toml {{").unwrap();

    let result = AppConfig::load(Some(f.path()));
    assert!(result.is_err());
}

#[test]
fn test_validate_lists_missing_fields() {
    let config = load(
        r#"
[azure]
project = "Fabrikam"
"#,
    );
    let err = config.validate().unwrap_err().to_string();
    assert!(err.contains("org_url"));
    assert!(err.contains("repository"));
    assert!(!err.contains("project,"));
}

#[test]
fn test_validate_rejects_zero_page_size() {
    let config = load(
        r#"
[azure]
org_url = "https://dev.azure.com/contoso"
project = "Fabrikam"
repository = "web"

[report]
page_size = 0
"#,
    );
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_huge_lookback() {
    let mut config = load(
        r#"
[azure]
org_url = "https://dev.azure.com/contoso"
project = "Fabrikam"
repository = "web"

[report]
lookback_days = 100000000
"#,
    );
    let err = config.validate().unwrap_err().to_string();
    assert!(err.contains("lookback_days"));

    config.report.lookback_days = MAX_LOOKBACK_DAYS;
    assert!(config.validate().is_ok());

    config.report.lookback_days = MAX_LOOKBACK_DAYS + 1;
    assert!(config.validate().is_err());
}

// --- Token resolution ---

#[test]
fn test_configured_token_wins() {
    let token = resolve_token_with(Some("from-config"), |_| Some("from-env".into())).unwrap();
    assert_eq!(token, "from-config");
}

#[test]
fn test_token_falls_back_to_env_in_order() {
    let token = resolve_token_with(None, |name| match name {
        "AZURE_DEVOPS_PAT" => Some("  ".into()),
        "AZURE_DEVOPS_EXT_PAT" => Some("ext-token".into()),
        _ => None,
    })
    .unwrap();
    assert_eq!(token, "ext-token");
}

#[test]
fn test_missing_token_fails() {
    let result = resolve_token_with(Some(""), |_| None);
    assert!(result.is_err());
}

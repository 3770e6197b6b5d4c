use mindloom::handlers::*;

#[test]
fn test_resolve_database_path_appends_filename() {
    let path = resolve_database_path("/tmp/mindloom-test/");
    assert_eq!(path, std::path::PathBuf::from("/tmp/mindloom-test/mindloom.db"));
}

#[test]
fn test_resolve_database_path_expands_tilde() {
    let path = resolve_database_path("~/.config/mindloom/");
    let rendered = path.to_string_lossy();
    assert!(!rendered.starts_with('~'));
    assert!(rendered.ends_with("mindloom.db"));
}

#[test]
fn test_provider_config_defaults() {
    let config = ProviderConfig::from_lookup(|_| None);
    assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    assert!(config.api_key.is_none());
    assert!(config.model.is_none());
}

#[test]
fn test_provider_config_reads_overrides() {
    let config = ProviderConfig::from_lookup(|key| match key {
        "MINDLOOM_ENDPOINT" => Some("http://localhost:8080/v1/chat/completions".to_string()),
        "MINDLOOM_API_KEY" => Some("sk-test".to_string()),
        "MINDLOOM_MODEL" => Some("local-model".to_string()),
        _ => None,
    });

    assert_eq!(config.endpoint, "http://localhost:8080/v1/chat/completions");
    assert_eq!(config.api_key.as_deref(), Some("sk-test"));
    assert_eq!(config.model.as_deref(), Some("local-model"));
}

#[test]
fn test_format_updated_renders_dates() {
    // 2024-01-01T00:00:00Z
    assert_eq!(format_updated(1_704_067_200), "2024-01-01 00:00");
}

#[test]
fn test_format_updated_falls_back_on_invalid_timestamps() {
    assert_eq!(format_updated(i64::MAX), i64::MAX.to_string());
}

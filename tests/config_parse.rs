use leaf_check::config::Config;

#[test]
fn parse_example_config() {
    let raw = include_str!("../leaf-check.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert_eq!(cfg.api.base_url, "http://localhost:5000");
    assert_eq!(cfg.api.request_timeout_ms, 30_000);
    assert_eq!(cfg.api.health_timeout_ms, 5_000);
    assert_eq!(cfg.upload.max_file_size_bytes, 10 * 1024 * 1024);
    assert_eq!(cfg.upload.allowed_types.len(), 5);
    cfg.validate().expect("example config is valid");
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let raw = r#"
[api]
base_url = "http://10.1.1.1:8000"
predict_path = "/v1/predict"
"#;
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert_eq!(cfg.api.predict_url(), "http://10.1.1.1:8000/v1/predict");
    assert_eq!(cfg.progress.tick_ms, 200);
    assert_eq!(cfg.classification.non_target_marker, "Bukan Daun Durian");
}

#[test]
fn partial_sections_keep_remaining_defaults() {
    let cfg: Config =
        toml::from_str("[api]\nbase_url = \"http://10.0.0.5:5000\"\n").expect("parse TOML");
    assert_eq!(cfg.api.base_url, "http://10.0.0.5:5000");
    assert_eq!(cfg.api.predict_url(), "http://10.0.0.5:5000/predict");
    assert_eq!(cfg.api.health_url(), "http://10.0.0.5:5000/health");
    assert_eq!(cfg.api.upload_field, "image");
    assert_eq!(cfg.api.request_timeout_ms, 30_000);
    assert_eq!(cfg.api.health_timeout_ms, 5_000);

    let raw = r#"
[upload]
max_file_size_bytes = 1024

[progress]
cap_percent = 80.0

[logging]
json = true
"#;
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert_eq!(cfg.upload.max_file_size_bytes, 1024);
    assert_eq!(cfg.upload.allowed_types.len(), 5);
    assert_eq!(cfg.progress.cap_percent, 80.0);
    assert_eq!(cfg.progress.tick_ms, 200);
    assert!(cfg.logging.json);
    assert_eq!(cfg.logging.level, "info");
    cfg.validate().expect("partial config is valid");
}

#[test]
fn env_overrides_apply() {
    let mut cfg = Config::default();
    cfg.apply_overrides(|key| match key {
        "LEAF_CHECK_BASE_URL" => Some("http://192.168.1.20:5000".into()),
        "LEAF_CHECK_REQUEST_TIMEOUT_MS" => Some(" 45000 ".into()),
        "LEAF_CHECK_MAX_FILE_SIZE" => Some("2048".into()),
        "LEAF_CHECK_ALLOWED_TYPES" => Some("image/png, image/webp,,".into()),
        _ => None,
    })
    .expect("overrides apply");

    assert_eq!(cfg.api.base_url, "http://192.168.1.20:5000");
    assert_eq!(cfg.api.request_timeout_ms, 45_000);
    assert_eq!(cfg.api.health_timeout_ms, 5_000);
    assert_eq!(cfg.upload.max_file_size_bytes, 2048);
    assert_eq!(cfg.upload.allowed_types, vec!["image/png", "image/webp"]);
}

#[test]
fn malformed_override_is_rejected() {
    let mut cfg = Config::default();
    let err = cfg
        .apply_overrides(|key| (key == "LEAF_CHECK_HEALTH_TIMEOUT_MS").then(|| "soon".to_string()))
        .unwrap_err();
    assert!(format!("{err:#}").contains("LEAF_CHECK_HEALTH_TIMEOUT_MS"));
}

#[test]
fn validate_rejects_bad_values() {
    let mut cfg = Config::default();
    cfg.api.base_url = "not a url".into();
    assert!(cfg.validate().is_err());

    let mut cfg = Config::default();
    cfg.api.request_timeout_ms = 0;
    assert!(cfg.validate().is_err());

    let mut cfg = Config::default();
    cfg.upload.allowed_types.clear();
    assert!(cfg.validate().is_err());
}

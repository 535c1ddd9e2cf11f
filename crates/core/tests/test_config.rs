//! Tests for configuration parsing

use purchase_tester_core::config::ENTITLEMENT_API_URL;
use purchase_tester_core::{CheckoutEnvironment, Config, ConfigError, Session, UserIdentity};

#[test]
fn test_default_config() {
    let config = Config::default();
    assert!(config.entitlement_key.is_empty());
    assert!(config.checkout_key.is_none());
    assert!(!config.disable_receipt_submission);
    assert_eq!(config.checkout_environment, CheckoutEnvironment::Sandbox);
    assert_eq!(config.retry.max_retries, 3);
    assert_eq!(config.retry.base_delay_ms, 1000);
    assert_eq!(config.retry.max_delay_ms, 10_000);
    assert_eq!(config.entitlement_base_url(), ENTITLEMENT_API_URL);
}

#[test]
fn test_parse_full_config() {
    let toml_str = r#"
entitlement_key = "pdl_abc"
checkout_key = "test_123"
proxy_url = "https://proxy.example.com"
submission_delay_ms = 2000
country_code = "US"
disable_receipt_submission = true
checkout_environment = "production"

[retry]
max_retries = 5
base_delay_ms = 250
"#;

    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.entitlement_key, "pdl_abc");
    assert_eq!(config.checkout_key().unwrap(), "test_123");
    assert_eq!(
        config.entitlement_base_url(),
        "https://proxy.example.com/v1"
    );
    assert_eq!(
        config.submission_delay(),
        Some(std::time::Duration::from_secs(2))
    );
    assert!(config.disable_receipt_submission);
    assert_eq!(config.checkout_environment, CheckoutEnvironment::Production);
    assert_eq!(config.retry.max_retries, 5);
    assert_eq!(config.retry.base_delay_ms, 250);
    // unspecified retry fields keep their defaults
    assert_eq!(config.retry.max_delay_ms, 10_000);
    assert_eq!(config.validate(), Ok(()));
}

#[test]
fn test_save_and_load_roundtrip() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config.toml");

    let config = Config::new("pdl_abc")
        .with_checkout_key("test_123")
        .with_country_code("DE");
    config.save(&path).unwrap();

    let loaded = Config::from_file(&path).unwrap();
    assert_eq!(loaded.entitlement_key, "pdl_abc");
    assert_eq!(loaded.country_code.as_deref(), Some("DE"));
    assert!(loaded.proxy_url.is_none());
}

#[test]
fn test_zero_submission_delay_is_none() {
    let mut config = Config::new("k");
    config.submission_delay_ms = Some(0);
    assert!(config.submission_delay().is_none());
}

#[test]
fn test_invalid_proxy_rejected() {
    let config = Config::new("k").with_proxy_url("ftp://files.example.com");
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidProxyUrl(_))
    ));

    let config = Config::new("k").with_proxy_url("not a url");
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidProxyUrl(_))
    ));
}

#[test]
fn test_session_validates_before_use() {
    let identity = UserIdentity::named("user_1").unwrap();
    let err = Session::new(Config::new("pdl_abc"), identity.clone()).unwrap_err();
    assert_eq!(err, ConfigError::MissingCheckoutKey);

    let session = Session::new(
        Config::new("pdl_abc").with_checkout_key("test_123"),
        identity,
    )
    .unwrap();
    assert_eq!(session.user_id(), "user_1");
    assert_eq!(session.entitlement_key(), "pdl_abc");
}

#[test]
fn test_identity_serde() {
    let id = UserIdentity::anonymous();
    let json = serde_json::to_string(&id).unwrap();
    let back: UserIdentity = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);

    let legacy: UserIdentity = serde_json::from_str(r#"{"user_id": "bob"}"#).unwrap();
    assert!(!legacy.is_anonymous);
}

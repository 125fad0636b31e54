//! Integration tests for logging system

use core_runtime::config::BridgeConfig;
use core_runtime::logging::{init_logging, redact_header, LogFormat, LogLevel, LoggingConfig};

#[test]
fn test_logging_initializes_once() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);

    init_logging(config.clone()).unwrap();
    tracing::info!(command = "local_app_request", "logging initialized");

    // A global subscriber is already installed
    assert!(init_logging(config).is_err());
}

#[test]
fn test_invalid_filter_is_rejected_before_install() {
    let config = LoggingConfig::default().with_filter("core_xhr=notalevel");
    assert!(init_logging(config).is_err());
}

#[test]
fn test_authorization_never_logged_verbatim() {
    let value = "Basic Ym9iOnNlY3JldA==";
    assert_eq!(redact_header("Authorization", value), "[REDACTED]");
    assert_eq!(redact_header("AUTHORIZATION", value), "[REDACTED]");
    assert_eq!(redact_header("X-Request-Id", "42"), "42");
}

#[test]
fn test_config_and_logging_compose() {
    let config = BridgeConfig::builder()
        .command("local_app_request")
        .build()
        .unwrap();
    tracing::debug!(command = %config.command, "config built");
    assert_eq!(config.reserved_scheme, "ipc://");
}

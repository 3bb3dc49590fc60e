use std::time::Duration;

use rusty_fork::rusty_fork_test;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use similar_asserts::assert_eq;

use super::ConfigValidationError;
use super::core_config::*;
use crate::filter_compiler::capabilities::Hierarchy;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BrowserConfig {
    pub trace_level: Option<String>,
}

#[test]
#[cfg(feature = "config_yaml")]
fn test_defaults_are_applied() {
    let config = AppConfig::<NoCustomConfig>::from_yaml(["apiUrl: 'http://catalog/api'"]).unwrap();

    assert_eq!("http://catalog/api", config.core.api_url.as_str());
    assert_eq!(Hierarchy::Generic, config.core.facility);
    assert_eq!(vec![10, 20, 30], config.core.page_sizes);
    assert_eq!(Duration::from_millis(500), config.core.debounce);
    assert_eq!(1, config.core.lookahead_pages);
    assert_eq!(None, config.core.request_timeout);
    assert!(config.core.session_token.is_none());
    assert!(config.core.validate().is_ok());
}

#[test]
#[cfg(feature = "config_yaml")]
fn test_later_files_override_earlier_ones() {
    let base = indoc::indoc! {"
        apiUrl: 'http://catalog/api'
        facility: GENERIC
        debounce: 500
        app:
            traceLevel: 'info'
    "};
    let overrides = indoc::indoc! {"
        facility: ISIS
        pageSizes: [25, 50]
        debounce: 250
        requestTimeout: 30
        username: 'user1'
        sessionToken: 'secret'
        app:
            traceLevel: 'debug'
    "};

    let config = AppConfig::<BrowserConfig>::from_yaml([base, overrides]).unwrap();

    assert_eq!(Hierarchy::Isis, config.core.facility);
    assert_eq!(vec![25, 50], config.core.page_sizes);
    assert_eq!(Duration::from_millis(250), config.core.debounce);
    assert_eq!(Some(Duration::from_secs(30)), config.core.request_timeout);
    assert_eq!(Some("user1"), config.core.username.as_deref());
    assert_eq!(
        Some("secret"),
        config
            .core
            .session_token
            .as_ref()
            .map(|token| token.expose_secret())
    );
    assert_eq!(Some("debug"), config.app.trace_level.as_deref());
    assert_eq!(25, config.core.page_sizes().unwrap().smallest());
}

#[test]
#[cfg(feature = "config_yaml")]
fn test_missing_api_url_fails() {
    assert!(AppConfig::<NoCustomConfig>::from_yaml(["facility: DLS"]).is_err());
}

#[test]
#[cfg(feature = "config_yaml")]
fn test_validation() {
    let config = |extra: &str| {
        AppConfig::<NoCustomConfig>::from_yaml(["apiUrl: 'https://catalog/api'", extra])
            .unwrap()
            .core
    };

    assert_eq!(
        Err(ConfigValidationError::EmptyPageSizes),
        config("pageSizes: [0]").validate()
    );
    assert_eq!(
        Err(ConfigValidationError::ZeroLookahead),
        config("lookaheadPages: 0").validate()
    );
    assert_eq!(
        Err(ConfigValidationError::UnsupportedScheme("ftp".to_owned())),
        config("apiUrl: 'ftp://catalog'").validate()
    );
}

#[test]
fn test_unsupported_file_extension() {
    assert!(AppConfig::<NoCustomConfig>::from_files(&["config.toml"]).is_err());
}

rusty_fork_test! {
    #[test]
    #[cfg(all(feature = "config_yaml", feature = "config_env"))]
    fn test_environment_overrides_files() {
        // SAFETY: runs in a forked process
        unsafe {
            std::env::set_var("CATALOG_facility", "DLS");
            std::env::set_var("CATALOG_lookaheadPages", "2");
        }

        let config = AppConfig::<NoCustomConfig>::from_yaml([
            "apiUrl: 'http://catalog/api'\nfacility: ISIS",
        ])
        .unwrap();

        assert_eq!(Hierarchy::Dls, config.core.facility);
        assert_eq!(2, config.core.lookahead_pages);
    }
}

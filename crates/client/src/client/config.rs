//! Client configuration

use serde::{Deserialize, Serialize};

/// Default refresh endpoint, relative to the base URL
pub const DEFAULT_REFRESH_ENDPOINT: &str = "/user/refresh";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing slash
    pub base_url: String,

    /// Request timeout in seconds (ignored in the browser)
    pub timeout_secs: Option<u64>,

    /// User agent override
    pub user_agent: Option<String>,

    /// Endpoint exchanging a refresh token for a new pair
    pub refresh_endpoint: String,

    /// Report a logged-in state even when no token is stored
    pub always_report_logged_in: bool,

    /// Page to navigate to when the session cannot be refreshed.
    /// `None` keeps the caller on the current page.
    pub login_redirect: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: Some(30),
            user_agent: None,
            refresh_endpoint: DEFAULT_REFRESH_ENDPOINT.to_string(),
            always_report_logged_in: false,
            login_redirect: None,
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl ClientConfig {
    /// Load configuration from a TOML file, with `FOODSCHED_*` overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or parsed
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, config::ConfigError> {
        let settings = Self::defaults()?
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix("FOODSCHED"))
            .build()?;

        settings.try_deserialize()
    }

    /// Load configuration from defaults and `FOODSCHED_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables cannot be parsed
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let settings = Self::defaults()?
            .add_source(config::Environment::with_prefix("FOODSCHED"))
            .build()?;

        settings.try_deserialize()
    }

    fn defaults()
    -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        let defaults = Self::default();
        config::Config::builder()
            .set_default("base_url", defaults.base_url)?
            .set_default("refresh_endpoint", defaults.refresh_endpoint)?
            .set_default("always_report_logged_in", defaults.always_report_logged_in)
    }
}

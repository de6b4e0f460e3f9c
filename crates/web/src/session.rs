//! Page-level client bootstrap

use crate::storage::{DocumentCookieJar, LocalStorageStore};
use foodsched_client::{AccountService, ApiClient, ClientConfig, ClientError, TokenStore};
use std::sync::Arc;
use tracing::{info, warn};

/// Origin of the current page, used as the default API base URL
pub fn window_origin() -> Option<String> {
    web_sys::window()?.location().origin().ok()
}

fn current_path() -> String {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_default()
}

fn navigate(path: &str) {
    match web_sys::window() {
        Some(window) => {
            if let Err(e) = window.location().set_href(path) {
                warn!(path, error = ?e, "Navigation failed");
            }
        }
        None => warn!(path, "No window to navigate"),
    }
}

/// Services for one page, built once and shared by reference
#[derive(Clone, Debug)]
pub struct WebClient {
    pub tokens: TokenStore,
    pub api: ApiClient,
    pub accounts: AccountService,
    login_redirect: Option<String>,
}

impl WebClient {
    /// Build the browser services. An empty `base_url` means the page origin.
    pub fn init(mut config: ClientConfig) -> Result<Self, ClientError> {
        if config.base_url.is_empty() {
            config.base_url = window_origin().ok_or_else(|| {
                ClientError::Configuration("no window origin to derive base_url from".into())
            })?;
        }

        let tokens = TokenStore::new(Arc::new(LocalStorageStore), Arc::new(DocumentCookieJar))
            .with_always_report_logged_in(config.always_report_logged_in);

        let mut api = ApiClient::from_config(&config, tokens.clone())?;
        if let Some(login_path) = config.login_redirect.clone() {
            api.set_auth_expired_hook(Some(Arc::new(move || {
                info!(path = %login_path, "Session expired; redirecting to login");
                navigate(&login_path);
            })));
        }

        info!(base_url = %config.base_url, "Client initialized");

        Ok(Self {
            accounts: AccountService::new(api.clone()),
            api,
            tokens,
            login_redirect: config.login_redirect,
        })
    }

    /// Services talking to the page origin with default settings
    pub fn for_current_origin() -> Result<Self, ClientError> {
        Self::init(ClientConfig {
            base_url: String::new(),
            ..ClientConfig::default()
        })
    }

    /// Check the login state for the current page.
    ///
    /// Login and register pages are exempt. When the user is not logged in
    /// and a login redirect is configured, the page navigates there.
    pub fn check_login_status(&self) -> bool {
        let path = current_path();
        if self.tokens.is_logged_in() || is_public_page(&path) {
            return true;
        }

        match &self.login_redirect {
            Some(login_path) => {
                info!(%path, "No token found; redirecting to login");
                navigate(login_path);
            }
            None => info!(%path, "No token found; login required"),
        }
        false
    }
}

fn is_public_page(path: &str) -> bool {
    path.contains("login") || path.contains("register")
}

//! Access/refresh token persistence
//!
//! Tokens live on two surfaces: a durable key-value store (`localStorage` in
//! the browser, a JSON file for the CLI) and the cookie jar. This layer only
//! ever writes tokens to the key-value store. Cookies are written by the
//! backend through `Set-Cookie` response headers on login and refresh; the
//! only cookie directives issued here are the expiring ones in
//! [`TokenStore::clear_tokens`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Key and cookie name for the access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Key and cookie name for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Directive that expires the access token cookie
pub const EXPIRE_ACCESS_COOKIE: &str =
    "access_token=; expires=Thu, 01 Jan 1970 00:00:00 UTC; path=/;";

/// Directive that expires the refresh token cookie
pub const EXPIRE_REFRESH_COOKIE: &str =
    "refresh_token=; expires=Thu, 01 Jan 1970 00:00:00 UTC; path=/; HttpOnly; Secure; SameSite=Lax;";

const PAST_EXPIRY: &str = "Thu, 01 Jan 1970 00:00:00 UTC";

/// Durable key-value storage surface
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if absent
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str);

    /// Remove a value if present
    fn remove(&self, key: &str);
}

/// Cookie jar surface, modelled on `document.cookie`
pub trait CookieJar: Send + Sync {
    /// The `; `-separated `name=value` list visible to the client
    fn cookie_header(&self) -> String;

    /// Apply a raw cookie directive such as `name=value; path=/`
    fn write(&self, directive: &str);
}

/// Find `name` in a `; `-separated cookie header.
///
/// The first matching pair wins. Names are compared exactly.
pub fn parse_cookie(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim_start)
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Token pair as issued by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl TokenPair {
    /// Pair carried by a login response body; `None` without a non-empty
    /// `access_token`
    pub fn from_body(body: &serde_json::Value) -> Option<Self> {
        let text = |key: &str| {
            body.get(key)
                .and_then(serde_json::Value::as_str)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        Some(Self {
            access_token: text("access_token")?,
            refresh_token: text("refresh_token"),
        })
    }
}

/// Shared handle to the token surfaces
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
    cookies: Arc<dyn CookieJar>,
    always_report_logged_in: bool,
}

impl TokenStore {
    /// Create a token store over the given surfaces
    pub fn new(store: Arc<dyn KeyValueStore>, cookies: Arc<dyn CookieJar>) -> Self {
        Self {
            store,
            cookies,
            always_report_logged_in: false,
        }
    }

    /// Token store backed entirely by memory
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryCookieJar::new()))
    }

    /// Make [`is_logged_in`](Self::is_logged_in) report `true` regardless of
    /// stored tokens. Intended for debugging pages without a backend session.
    pub fn with_always_report_logged_in(mut self, enabled: bool) -> Self {
        self.always_report_logged_in = enabled;
        self
    }

    /// Access token from the durable store
    pub fn get_access_token(&self) -> Option<String> {
        let token = self.store.get(ACCESS_TOKEN_KEY);
        debug!(found = token.is_some(), "Read access token from durable store");
        token
    }

    /// Refresh token from the durable store
    pub fn get_refresh_token(&self) -> Option<String> {
        self.store.get(REFRESH_TOKEN_KEY)
    }

    /// Cookie value visible to the client
    pub fn get_from_cookie(&self, name: &str) -> Option<String> {
        let value = parse_cookie(&self.cookies.cookie_header(), name);
        debug!(cookie = name, found = value.is_some(), "Looked up cookie");
        value
    }

    /// Store a new access token, and the refresh token when one is given
    pub fn set_tokens(&self, access_token: &str, refresh_token: Option<&str>) {
        self.store.set(ACCESS_TOKEN_KEY, access_token);
        if let Some(refresh_token) = refresh_token.filter(|t| !t.is_empty()) {
            self.store.set(REFRESH_TOKEN_KEY, refresh_token);
        }
    }

    /// Store a token pair
    pub fn store_pair(&self, pair: &TokenPair) {
        self.set_tokens(&pair.access_token, pair.refresh_token.as_deref());
    }

    /// Drop both tokens from the durable store and expire both cookies
    pub fn clear_tokens(&self) {
        self.store.remove(ACCESS_TOKEN_KEY);
        self.store.remove(REFRESH_TOKEN_KEY);
        self.cookies.write(EXPIRE_ACCESS_COOKIE);
        self.cookies.write(EXPIRE_REFRESH_COOKIE);
        debug!("Cleared stored tokens");
    }

    /// Whether an access token is present in either surface
    pub fn has_access_token(&self) -> bool {
        let stored = self.get_access_token().is_some_and(|t| !t.is_empty());
        let cookie = self
            .get_from_cookie(ACCESS_TOKEN_KEY)
            .is_some_and(|t| !t.is_empty());
        debug!(stored, cookie, "Checked access token presence");
        stored || cookie
    }

    /// Coarse logged-in flag
    pub fn is_logged_in(&self) -> bool {
        let present = self.has_access_token();
        let logged_in = self.always_report_logged_in || present;
        debug!(
            logged_in,
            overridden = self.always_report_logged_in,
            "Computed login status"
        );
        logged_in
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("always_report_logged_in", &self.always_report_logged_in)
            .finish_non_exhaustive()
    }
}

/// In-memory key-value store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }
}

/// In-memory cookie jar.
///
/// Keeps insertion order so [`cookie_header`](CookieJar::cookie_header) reads
/// like `document.cookie`. A directive carrying the epoch expiry or
/// `Max-Age=0` deletes the cookie.
#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    cookies: RwLock<Vec<(String, String)>>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a cookie, as a backend `Set-Cookie` header would
    pub fn with_cookie(self, name: &str, value: &str) -> Self {
        self.write(&format!("{name}={value}; path=/"));
        self
    }
}

fn expires_now(attributes: &str) -> bool {
    attributes
        .split(';')
        .filter_map(|attr| attr.trim().split_once('='))
        .any(|(key, value)| {
            let key = key.trim();
            (key.eq_ignore_ascii_case("expires") && value.trim() == PAST_EXPIRY)
                || (key.eq_ignore_ascii_case("max-age")
                    && value.trim().parse::<i64>().is_ok_and(|age| age <= 0))
        })
}

impl CookieJar for MemoryCookieJar {
    fn cookie_header(&self) -> String {
        self.cookies
            .read()
            .map(|cookies| {
                cookies
                    .iter()
                    .map(|(name, value)| format!("{name}={value}"))
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .unwrap_or_default()
    }

    fn write(&self, directive: &str) {
        let (pair, attributes) = directive.split_once(';').unwrap_or((directive, ""));
        let Some((name, value)) = pair.split_once('=') else {
            return;
        };
        let name = name.trim();

        let Ok(mut cookies) = self.cookies.write() else {
            return;
        };
        cookies.retain(|(existing, _)| existing != name);
        if !expires_now(attributes) {
            cookies.push((name.to_string(), value.trim().to_string()));
        }
    }
}

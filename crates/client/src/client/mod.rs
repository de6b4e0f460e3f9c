//! Food Scheduler HTTP client
//!
//! Every call attaches the stored access token as a bearer credential when
//! `require_auth` is set. A 401 triggers at most one refresh-then-retry
//! cycle; refreshes from concurrent calls are coalesced by [`RefreshGate`].

pub mod config;
pub mod error;
pub mod refresh;

pub use config::ClientConfig;
pub use error::ClientError;

use crate::tokens::TokenStore;
use crate::types::{RefreshRequest, TokenResponse};
use refresh::{RefreshAttempt, RefreshGate, RefreshOutcome};
use reqwest::{Client, ClientBuilder, Method, Response, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Callback fired when the session cannot be recovered
pub type AuthExpiredHook = Arc<dyn Fn() + Send + Sync>;

/// A request captured before the first attempt so it can be replayed
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub endpoint: String,
    pub body: Option<Value>,
    pub require_auth: bool,
}

impl RequestContext {
    /// Authenticated request without a body
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            body: None,
            require_auth: true,
        }
    }

    /// Attach a JSON body
    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ClientError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Set whether the stored access token is sent
    pub fn require_auth(mut self, require_auth: bool) -> Self {
        self.require_auth = require_auth;
        self
    }

    fn carries_body(&self) -> bool {
        self.method != Method::GET && self.method != Method::DELETE
    }
}

/// Food Scheduler API client
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    refresh_endpoint: String,
    tokens: TokenStore,
    refresh: Arc<RefreshGate>,
    on_auth_expired: Option<AuthExpiredHook>,
}

impl ApiClient {
    /// Create a new client with in-memory token storage
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Build a client from configuration
    pub fn from_config(config: &ClientConfig, tokens: TokenStore) -> Result<Self, ClientError> {
        let mut builder = Self::builder()
            .base_url(&config.base_url)
            .tokens(tokens)
            .refresh_endpoint(&config.refresh_endpoint);

        if let Some(timeout_secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent);
        }

        builder.build()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Token store this client reads credentials from
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Replace the auth-expired callback
    pub fn set_auth_expired_hook(&mut self, hook: Option<AuthExpiredHook>) {
        self.on_auth_expired = hook;
    }

    pub async fn get(&self, endpoint: &str, require_auth: bool) -> Result<Value, ClientError> {
        self.send(RequestContext::new(Method::GET, endpoint).require_auth(require_auth))
            .await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        require_auth: bool,
    ) -> Result<Value, ClientError> {
        let context = RequestContext::new(Method::POST, endpoint)
            .with_json(body)?
            .require_auth(require_auth);
        self.send(context).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        require_auth: bool,
    ) -> Result<Value, ClientError> {
        let context = RequestContext::new(Method::PUT, endpoint)
            .with_json(body)?
            .require_auth(require_auth);
        self.send(context).await
    }

    pub async fn delete(&self, endpoint: &str, require_auth: bool) -> Result<Value, ClientError> {
        self.send(RequestContext::new(Method::DELETE, endpoint).require_auth(require_auth))
            .await
    }

    /// Send a request and decode the successful body into `T`
    pub async fn send_as<T: DeserializeOwned>(
        &self,
        context: RequestContext,
    ) -> Result<T, ClientError> {
        let value = self.send(context).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Send a request, refreshing the session once on 401
    pub async fn send(&self, context: RequestContext) -> Result<Value, ClientError> {
        let epoch = self.refresh.epoch();
        let response = self.dispatch(&context).await?;
        let status = response.status();
        let body = read_body(response).await;

        if status == StatusCode::UNAUTHORIZED {
            return self.recover_unauthorized(&context, epoch, body).await;
        }

        into_result(status, body)
    }

    /// Create a request builder with the JSON content type and, when
    /// `require_auth` is set and a token is stored, the bearer credential
    pub fn request(&self, method: Method, path: &str, require_auth: bool) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .request(method, url)
            .header(header::CONTENT_TYPE, "application/json");

        if require_auth && let Some(token) = self.tokens.get_access_token() {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        request
    }

    async fn dispatch(&self, context: &RequestContext) -> Result<Response, ClientError> {
        let mut request = self.request(
            context.method.clone(),
            &context.endpoint,
            context.require_auth,
        );
        if context.carries_body()
            && let Some(body) = &context.body
        {
            request = request.json(body);
        }

        request.send().await.map_err(|e| {
            error!(
                method = %context.method,
                endpoint = %context.endpoint,
                error = %e,
                "API request failed"
            );
            ClientError::Transport(e)
        })
    }

    async fn recover_unauthorized(
        &self,
        context: &RequestContext,
        epoch: u64,
        body: Value,
    ) -> Result<Value, ClientError> {
        let attempt = self
            .refresh
            .refresh(epoch, &self.tokens, |refresh_token| {
                self.refresh_tokens(refresh_token)
            })
            .await;

        match attempt {
            RefreshAttempt::NoRefreshToken => {
                warn!(endpoint = %context.endpoint, "Received 401 without a refresh token");
                self.notify_auth_expired(context);
                return Err(ClientError::auth_expired("no refresh token stored", Some(body)));
            }
            RefreshAttempt::Ran(RefreshOutcome::Failed(reason)) => {
                error!(%reason, "Token refresh failed");
                self.notify_auth_expired(context);
                return Err(ClientError::auth_expired(reason, None));
            }
            RefreshAttempt::Joined(RefreshOutcome::Failed(reason)) => {
                debug!(endpoint = %context.endpoint, "Joined a failed refresh");
                return Err(ClientError::auth_expired(reason, None));
            }
            RefreshAttempt::Ran(RefreshOutcome::Refreshed)
            | RefreshAttempt::Joined(RefreshOutcome::Refreshed) => {}
        }

        debug!(method = %context.method, endpoint = %context.endpoint, "Retrying with refreshed token");
        let retry = self.dispatch(context).await?;
        let status = retry.status();
        let body = read_body(retry).await;
        if status == StatusCode::UNAUTHORIZED {
            self.tokens.clear_tokens();
            self.notify_auth_expired(context);
            return Err(ClientError::auth_expired(
                "request rejected after token refresh",
                Some(body),
            ));
        }

        into_result(status, body)
    }

    /// Exchange `refresh_token` for a new pair. Tokens are cleared when the
    /// exchange fails.
    async fn refresh_tokens(&self, refresh_token: String) -> Result<(), String> {
        let result = self.exchange_refresh_token(refresh_token).await;
        match &result {
            Ok(pair) => {
                self.tokens
                    .set_tokens(&pair.access_token, pair.refresh_token.as_deref());
                info!("Access token refreshed");
            }
            Err(_) => self.tokens.clear_tokens(),
        }
        result.map(|_| ())
    }

    async fn exchange_refresh_token(&self, refresh_token: String) -> Result<TokenResponse, String> {
        let url = format!("{}{}", self.base_url, self.refresh_endpoint);
        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(|e| format!("refresh request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("refresh endpoint answered {status}"));
        }

        response
            .json()
            .await
            .map_err(|e| format!("invalid refresh response: {e}"))
    }

    /// Fire the auth-expired hook for calls that carried credentials
    fn notify_auth_expired(&self, context: &RequestContext) {
        if context.require_auth
            && let Some(hook) = &self.on_auth_expired
        {
            hook();
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("refresh_endpoint", &self.refresh_endpoint)
            .finish_non_exhaustive()
    }
}

/// Read a response body as JSON, degrading to `{}` when it is not JSON
async fn read_body(response: Response) -> Value {
    match response.bytes().await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|_| empty_object()),
        Err(e) => {
            debug!(error = %e, "Failed to read response body");
            empty_object()
        }
    }
}

fn into_result(status: StatusCode, body: Value) -> Result<Value, ClientError> {
    if status.is_success() {
        Ok(body)
    } else {
        Err(ClientError::from_response(status, body))
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Builder for ApiClient
#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    tokens: Option<TokenStore>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    refresh_endpoint: Option<String>,
    on_auth_expired: Option<AuthExpiredHook>,
}

impl ApiClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the token store (defaults to an in-memory one)
    pub fn tokens(mut self, tokens: TokenStore) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the refresh endpoint path
    pub fn refresh_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.refresh_endpoint = Some(endpoint.into());
        self
    }

    /// Callback fired when a 401 cannot be recovered
    pub fn on_auth_expired(mut self, hook: AuthExpiredHook) -> Self {
        self.on_auth_expired = Some(hook);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();
        url::Url::parse(&base_url).map_err(|e| {
            ClientError::Configuration(format!("invalid base_url {base_url:?}: {e}"))
        })?;

        let client_builder = ClientBuilder::new();

        #[cfg(not(target_arch = "wasm32"))]
        let client_builder = {
            let mut client_builder = client_builder.user_agent(
                self.user_agent
                    .unwrap_or_else(|| concat!("foodsched-client/", env!("CARGO_PKG_VERSION")).to_string()),
            );
            if let Some(timeout) = self.timeout {
                client_builder = client_builder.timeout(timeout);
            }
            client_builder
        };

        #[cfg(target_arch = "wasm32")]
        let _ = (self.timeout, self.user_agent); // The browser owns both

        let client = client_builder.build()?;

        Ok(ApiClient {
            client,
            base_url,
            refresh_endpoint: self
                .refresh_endpoint
                .unwrap_or_else(|| config::DEFAULT_REFRESH_ENDPOINT.to_string()),
            tokens: self.tokens.unwrap_or_else(TokenStore::in_memory),
            refresh: Arc::new(RefreshGate::new()),
            on_auth_expired: self.on_auth_expired,
        })
    }
}

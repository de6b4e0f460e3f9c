//! Client layer for the Food Scheduler backend
//!
//! [`TokenStore`] keeps the access and refresh tokens, [`ApiClient`] issues
//! JSON requests with bearer auth and recovers from expired access tokens,
//! and [`AccountService`] wraps the `/user` endpoints. Construct one of each
//! per application and pass them by reference.

pub mod account;
pub mod client;
pub mod tokens;
pub mod types;

pub use account::AccountService;
pub use client::{ApiClient, ApiClientBuilder, ClientConfig, ClientError, RequestContext};
pub use reqwest::Method;
pub use tokens::{CookieJar, KeyValueStore, MemoryCookieJar, MemoryStore, TokenPair, TokenStore};

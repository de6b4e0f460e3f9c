//! Single-flight coordination of token refreshes
//!
//! Every request snapshots the gate's epoch before it is sent. When it comes
//! back 401 it calls [`RefreshGate::refresh`] with that snapshot. Refreshes
//! run one at a time behind the gate's mutex. A caller joins the outcome of a
//! refresh that settled after its snapshot only while the stored refresh
//! token is still the one that refresh left behind; once the tokens change
//! (a new login, a manual `set_tokens`) the settled outcome is stale and the
//! caller refreshes with what is stored now.

use crate::tokens::TokenStore;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

/// Result of a refresh attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed,
    Failed(String),
}

/// How a caller got past the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshAttempt {
    /// This caller called the refresh endpoint
    Ran(RefreshOutcome),
    /// Another caller's refresh settled while this one waited
    Joined(RefreshOutcome),
    /// Nothing to refresh with
    NoRefreshToken,
}

#[derive(Debug)]
struct Settled {
    outcome: RefreshOutcome,
    /// Refresh token stored once the attempt finished
    left_behind: Option<String>,
}

#[derive(Debug, Default)]
pub struct RefreshGate {
    epoch: AtomicU64,
    last: Mutex<Option<Settled>>,
}

impl RefreshGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed refresh attempts
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Refresh with the stored refresh token, or join a refresh that settled
    /// after `observed` was taken.
    ///
    /// `refresh` runs under the gate's lock and must leave `tokens` in their
    /// final state (new pair stored, or cleared on failure) before returning.
    pub async fn refresh<F, Fut>(
        &self,
        observed: u64,
        tokens: &TokenStore,
        refresh: F,
    ) -> RefreshAttempt
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<(), String>>,
    {
        let mut last = self.last.lock().await;
        let stored = tokens.get_refresh_token();

        if self.epoch() != observed
            && let Some(settled) = last.as_ref()
            && settled.left_behind == stored
        {
            debug!(outcome = ?settled.outcome, "Joined a refresh that settled while waiting");
            return RefreshAttempt::Joined(settled.outcome.clone());
        }

        let Some(refresh_token) = stored else {
            return RefreshAttempt::NoRefreshToken;
        };

        let outcome = match refresh(refresh_token).await {
            Ok(()) => RefreshOutcome::Refreshed,
            Err(reason) => RefreshOutcome::Failed(reason),
        };
        *last = Some(Settled {
            outcome: outcome.clone(),
            left_behind: tokens.get_refresh_token(),
        });
        self.epoch.fetch_add(1, Ordering::AcqRel);
        RefreshAttempt::Ran(outcome)
    }
}

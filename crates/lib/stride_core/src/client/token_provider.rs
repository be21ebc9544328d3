//! Client-side identity token cache.
//!
//! Holds the one current token for the signed-in identity and refreshes it
//! through the [`IdentityProvider`]. All reads and the refresh-and-store
//! sequence run under one async mutex, so concurrent callers share a single
//! in-flight refresh and all observe its result. The cached entry remembers
//! which identity it was fetched for and is dropped once that identity is no
//! longer signed in.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::claims::decode_expiry;
use crate::clock::Clock;
use crate::config::{MAX_TUNABLE_SECS, env_lookup, tunable};
use crate::models::auth::TokenCacheEntry;

/// Default early-refresh margin: 120 seconds.
pub const DEFAULT_EARLY_REFRESH_WINDOW_SECS: i64 = 120;

/// Assumed lifetime when a token's `exp` cannot be decoded: 55 minutes.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3300;

/// Errors surfaced by an identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("No signed-in user")]
    NotSignedIn,

    #[error("Identity request failed: {0}")]
    Transport(String),

    #[error("Identity endpoint returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Identity response parse error: {0}")]
    Parse(String),
}

/// Errors surfaced to callers of [`TokenProvider`].
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Authentication unavailable: {0}")]
    AuthenticationUnavailable(#[from] IdentityError),
}

/// External issuer of signed identity tokens.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Obtain a signed token; `force_network` bypasses any provider-side cache.
    async fn refresh(&self, force_network: bool) -> Result<String, IdentityError>;

    /// Identity currently signed in, if any.
    async fn current_subject(&self) -> Option<String>;
}

/// Token provider tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenProviderConfig {
    /// Margin before `exp` at which a cached token counts as stale.
    pub early_refresh_window: Duration,
    /// Lifetime assumed when `exp` is missing or malformed.
    pub default_lifetime: Duration,
}

impl Default for TokenProviderConfig {
    fn default() -> Self {
        Self {
            early_refresh_window: Duration::seconds(DEFAULT_EARLY_REFRESH_WINDOW_SECS),
            default_lifetime: Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS),
        }
    }
}

impl TokenProviderConfig {
    /// Reads tunables from environment variables, falling back to defaults.
    ///
    /// | Variable                             | Default |
    /// |--------------------------------------|---------|
    /// | `STRIDE_EARLY_REFRESH_WINDOW_SECS`   | `120`   |
    /// | `STRIDE_DEFAULT_TOKEN_LIFETIME_SECS` | `3300`  |
    pub fn from_env() -> Self {
        Self::from_vars(env_lookup)
    }

    /// Same as [`TokenProviderConfig::from_env`] over an arbitrary variable
    /// source. Values are clamped to one week.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let window = tunable(
            &lookup,
            "STRIDE_EARLY_REFRESH_WINDOW_SECS",
            DEFAULT_EARLY_REFRESH_WINDOW_SECS,
            MAX_TUNABLE_SECS,
        );
        let lifetime = tunable(
            &lookup,
            "STRIDE_DEFAULT_TOKEN_LIFETIME_SECS",
            DEFAULT_TOKEN_LIFETIME_SECS,
            MAX_TUNABLE_SECS,
        );
        let defaults = Self::default();
        Self {
            early_refresh_window: Duration::try_seconds(window)
                .unwrap_or(defaults.early_refresh_window),
            default_lifetime: Duration::try_seconds(lifetime).unwrap_or(defaults.default_lifetime),
        }
    }
}

/// Serves the current identity token to outgoing calls.
pub struct TokenProvider {
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
    config: TokenProviderConfig,
    slot: Mutex<Option<TokenCacheEntry>>,
}

impl TokenProvider {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
        config: TokenProviderConfig,
    ) -> Self {
        Self {
            identity,
            clock,
            config,
            slot: Mutex::new(None),
        }
    }

    /// Cached token if it is outside the early-refresh window, otherwise a
    /// freshly refreshed one.
    pub async fn cached_or_fresh(&self) -> Result<String, TokenError> {
        let mut slot = self.slot.lock().await;
        let subject = self.identity.current_subject().await;

        let owner_changed = slot
            .as_ref()
            .is_some_and(|entry| !entry.belongs_to(subject.as_deref()));
        if owner_changed {
            debug!(subject = ?subject, "signed-in identity changed, dropping cached token");
            *slot = None;
        }

        if let Some(entry) = slot.as_ref()
            && entry.is_fresh(self.clock.now(), self.config.early_refresh_window)
        {
            return Ok(entry.token.clone());
        }
        debug!("cached token missing or inside early-refresh window");
        self.refresh_into(&mut slot, subject, false).await
    }

    /// Unconditionally fetch a new token, e.g. after the server rejected one.
    pub async fn force_fresh(&self) -> Result<String, TokenError> {
        let mut slot = self.slot.lock().await;
        let subject = self.identity.current_subject().await;
        if subject.is_none() && slot.take().is_some() {
            debug!("nobody signed in, dropping cached token");
        }
        self.refresh_into(&mut slot, subject, true).await
    }

    /// Identity currently signed in, independent of token freshness.
    pub async fn current_subject_id(&self) -> Option<String> {
        self.identity.current_subject().await
    }

    /// Forget the cached token without contacting the identity provider.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.lock().await;
        if slot.take().is_some() {
            debug!("token cache invalidated");
        }
    }

    /// Snapshot of the cached entry.
    pub async fn cached_entry(&self) -> Option<TokenCacheEntry> {
        self.slot.lock().await.clone()
    }

    /// Refresh and replace the slot. Nothing is written unless the refresh
    /// completes, so a cancelled caller leaves the previous entry intact.
    async fn refresh_into(
        &self,
        slot: &mut Option<TokenCacheEntry>,
        subject_id: Option<String>,
        force_network: bool,
    ) -> Result<String, TokenError> {
        let token = match self.identity.refresh(force_network).await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, force_network, "identity token refresh failed");
                return Err(TokenError::AuthenticationUnavailable(e));
            }
        };

        let now = self.clock.now();
        let expires_at = match decode_expiry(&token) {
            Some(exp) => exp,
            None => {
                let fallback = now
                    .checked_add_signed(self.config.default_lifetime)
                    .unwrap_or(now);
                warn!(expires_at = %fallback, "token expiry not decodable, assuming default lifetime");
                fallback
            }
        };

        *slot = Some(TokenCacheEntry {
            token: token.clone(),
            expires_at,
            subject_id,
        });
        info!(%expires_at, force_network, "identity token refreshed");
        Ok(token)
    }
}

//! Admin authorization gate.
//!
//! Turns an already signature-verified token into a time-bounded admin
//! session. Every request runs the same sequence:
//!
//! 1. extract the subject claim,
//! 2. reject tokens issued more than `max_token_age` ago (or with no usable `iat`),
//! 3. reuse an active cached session,
//! 4. otherwise ask the [`PrivilegeLookup`] and cache a fresh session on success.
//!
//! Any failure denies. The reasons in [`GateError`] are for logs only; callers
//! at the HTTP boundary must collapse them into a single response.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::cache::AdminSessionCache;
use crate::auth::AuthError;
use crate::clock::Clock;
use crate::config::{MAX_TUNABLE_MINUTES, MAX_TUNABLE_SECS, env_lookup, tunable};
use crate::models::auth::{AdminSession, PrivilegeRecord, TokenClaims};

/// Default maximum token age for admin elevation: 5 minutes.
pub const DEFAULT_MAX_TOKEN_AGE_MINUTES: i64 = 5;

/// Default admin-session lifetime: 10 minutes.
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 10;

/// Default bound on a single privilege lookup: 5 seconds.
pub const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 5;

/// External "is this subject an admin" data source.
#[async_trait]
pub trait PrivilegeLookup: Send + Sync {
    async fn lookup_privilege(&self, subject_id: &str) -> Result<PrivilegeRecord, AuthError>;
}

/// Why a request was denied.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("token carries no subject")]
    MissingIdentity,

    #[error("token is too old for admin elevation")]
    TokenTooOld,

    #[error("subject is not privileged")]
    NotPrivileged,

    #[error("privilege lookup failed: {0}")]
    PrivilegeLookupFailed(String),

    #[error("admin session expiry is out of range")]
    SessionUnavailable,
}

/// Gate tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateConfig {
    /// Maximum `now - iat` accepted for elevation.
    pub max_token_age: Duration,
    /// Lifetime of a freshly minted admin session.
    pub session_ttl: Duration,
    /// Bound on one privilege lookup call.
    pub lookup_timeout: std::time::Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_token_age: Duration::minutes(DEFAULT_MAX_TOKEN_AGE_MINUTES),
            session_ttl: Duration::minutes(DEFAULT_SESSION_TTL_MINUTES),
            lookup_timeout: std::time::Duration::from_secs(DEFAULT_LOOKUP_TIMEOUT_SECS),
        }
    }
}

impl GateConfig {
    /// Reads tunables from environment variables, falling back to defaults.
    ///
    /// | Variable                               | Default |
    /// |----------------------------------------|---------|
    /// | `STRIDE_MAX_TOKEN_AGE_MINUTES`         | `5`     |
    /// | `STRIDE_SESSION_TTL_MINUTES`           | `10`    |
    /// | `STRIDE_PRIVILEGE_LOOKUP_TIMEOUT_SECS` | `5`     |
    pub fn from_env() -> Self {
        Self::from_vars(env_lookup)
    }

    /// Same as [`GateConfig::from_env`] over an arbitrary variable source.
    /// Values are clamped to one week.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_age = tunable(
            &lookup,
            "STRIDE_MAX_TOKEN_AGE_MINUTES",
            DEFAULT_MAX_TOKEN_AGE_MINUTES,
            MAX_TUNABLE_MINUTES,
        );
        let ttl = tunable(
            &lookup,
            "STRIDE_SESSION_TTL_MINUTES",
            DEFAULT_SESSION_TTL_MINUTES,
            MAX_TUNABLE_MINUTES,
        );
        let timeout = tunable(
            &lookup,
            "STRIDE_PRIVILEGE_LOOKUP_TIMEOUT_SECS",
            DEFAULT_LOOKUP_TIMEOUT_SECS as i64,
            MAX_TUNABLE_SECS,
        );
        let defaults = Self::default();
        Self {
            max_token_age: Duration::try_minutes(max_age).unwrap_or(defaults.max_token_age),
            session_ttl: Duration::try_minutes(ttl).unwrap_or(defaults.session_ttl),
            lookup_timeout: std::time::Duration::from_secs(timeout.unsigned_abs()),
        }
    }
}

/// Decides per request whether the caller holds an admin session.
pub struct AuthorizationGate {
    config: GateConfig,
    cache: Arc<AdminSessionCache>,
    lookup: Arc<dyn PrivilegeLookup>,
    clock: Arc<dyn Clock>,
}

impl AuthorizationGate {
    pub fn new(
        config: GateConfig,
        cache: Arc<AdminSessionCache>,
        lookup: Arc<dyn PrivilegeLookup>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            cache,
            lookup,
            clock,
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<AdminSessionCache> {
        &self.cache
    }

    /// Grant (`Ok`) or deny (`Err`) admin access for verified `claims`.
    pub async fn authorize(&self, claims: &TokenClaims) -> Result<AdminSession, GateError> {
        let Some(subject) = claims.subject() else {
            warn!("admin request with a verified token but no subject claim; check the issuer");
            return Err(GateError::MissingIdentity);
        };

        self.check_freshness(subject, claims)?;

        let now = self.clock.now();
        if let Some(session) = self.cache.get(subject) {
            if session.is_active(now) {
                debug!(subject, expires_at = %session.expires_at, "admin session cache hit");
                return Ok(session);
            }
            if let Some(expired) = self.cache.remove_if_expired(subject) {
                debug!(subject, expired_at = %expired.expires_at, "evicted expired admin session");
            }
        }

        let record = match tokio::time::timeout(
            self.config.lookup_timeout,
            self.lookup.lookup_privilege(subject),
        )
        .await
        {
            Ok(Ok(record)) => record,
            Ok(Err(e)) => {
                warn!(subject, error = %e, "privilege lookup failed");
                return Err(GateError::PrivilegeLookupFailed(e.to_string()));
            }
            Err(_) => {
                warn!(
                    subject,
                    timeout_ms = self.config.lookup_timeout.as_millis() as u64,
                    "privilege lookup timed out"
                );
                return Err(GateError::PrivilegeLookupFailed("timed out".into()));
            }
        };

        if !record.grants_admin() {
            debug!(subject, found = record.found, "subject is not privileged");
            return Err(GateError::NotPrivileged);
        }

        let Some(session) =
            AdminSession::try_new(subject, self.clock.now(), self.config.session_ttl)
        else {
            warn!(
                subject,
                ttl_secs = self.config.session_ttl.num_seconds(),
                "admin session expiry out of range"
            );
            return Err(GateError::SessionUnavailable);
        };
        self.cache.insert(session.clone());
        info!(subject, expires_at = %session.expires_at, "admin session started");
        Ok(session)
    }

    /// Drop a subject's admin session, if any.
    pub fn end_session(&self, subject_id: &str) -> bool {
        let removed = self.cache.remove(subject_id).is_some();
        if removed {
            info!(subject = subject_id, "admin session ended");
        }
        removed
    }

    /// Missing or unparsable `iat` counts as infinitely old.
    fn check_freshness(&self, subject: &str, claims: &TokenClaims) -> Result<(), GateError> {
        let Some(issued_at) = claims.issued_at() else {
            debug!(subject, "token has no usable iat claim");
            return Err(GateError::TokenTooOld);
        };
        let age = self.clock.now() - issued_at;
        if age > self.config.max_token_age {
            debug!(subject, age_secs = age.num_seconds(), "token too old for admin elevation");
            return Err(GateError::TokenTooOld);
        }
        Ok(())
    }
}

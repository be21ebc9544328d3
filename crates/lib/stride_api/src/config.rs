//! API server configuration.

use stride_core::auth::AuthError;
use stride_core::auth::jwt::{jwt_secret_path, resolve_jwt_secret_with};
use stride_core::config::env_lookup;
use stride_core::session::GateConfig;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// PostgreSQL connection URL for the user/role store.
    pub pg_connection_url: String,
    /// Secret used to verify bearer tokens.
    pub jwt_secret: String,
    /// Admin gate tunables.
    pub gate: GateConfig,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable           | Default                                     |
    /// |--------------------|---------------------------------------------|
    /// | `BIND_ADDR`        | `127.0.0.1:3100`                            |
    /// | `DATABASE_URL`     | `postgres://localhost:5432/stride`          |
    /// | `JWT_SECRET` / `AUTH_SECRET` | generated & persisted to file     |
    ///
    /// Gate tunables come from [`GateConfig::from_env`].
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_vars(env_lookup)
    }

    /// [`ApiConfig::from_env`] over an arbitrary variable source.
    pub fn from_vars<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:3100".into()),
            pg_connection_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "postgres://localhost:5432/stride".into()),
            jwt_secret: resolve_jwt_secret_with(&lookup, &jwt_secret_path())?,
            gate: GateConfig::from_vars(&lookup),
        })
    }
}

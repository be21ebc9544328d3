//! Token handling and privilege data access.
//!
//! Provides access-token verification for the upstream bearer middleware,
//! unverified claim decoding for client-side scheduling, and the database
//! backed privilege lookup used by the authorization gate.

pub mod claims;
pub mod jwt;
pub mod queries;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
